use crate::config::AppConfig;
use crate::nutrition::source::{CsvNutritionSource, NutritionSource};
use crate::predictions::classifier::{init_classifier, ClassifierHandle};
use crate::recommendations::agent::{ChatCompletionsAgent, RecommendationAgent};
use std::sync::Arc;

/// Application context shared by every handler. Built once, read-only after.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classifier: ClassifierHandle,
    pub nutrition: Arc<dyn NutritionSource>,
    pub agent: Arc<dyn RecommendationAgent>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let classifier = init_classifier(config.classifier_url.as_deref()).await;
        let nutrition = Arc::new(CsvNutritionSource::load_or_empty(&config.nutrition_csv_path))
            as Arc<dyn NutritionSource>;
        let agent = Arc::new(ChatCompletionsAgent::new(config.llm.clone()))
            as Arc<dyn RecommendationAgent>;

        Ok(Self::from_parts(config, classifier, nutrition, agent))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        classifier: ClassifierHandle,
        nutrition: Arc<dyn NutritionSource>,
        agent: Arc<dyn RecommendationAgent>,
    ) -> Self {
        Self {
            config,
            classifier,
            nutrition,
            agent,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::nutrition::record::NutritionRecord;

        let config = Arc::new(AppConfig {
            llm: crate::config::LlmConfig {
                api_key: "test".into(),
                model: "test".into(),
                base_url: "http://fake.local".into(),
                temperature: 0.0,
                max_steps: 2,
            },
            classifier_url: None,
            nutrition_csv_path: "fake.csv".into(),
        });

        let nutrition = Arc::new(CsvNutritionSource::from_rows(vec![
            NutritionRecord {
                energy_kcal: Some(89.0),
                protein_g: Some(1.1),
                ..NutritionRecord::named("banana")
            },
            NutritionRecord {
                energy_kcal: Some(130.0),
                carbs_g: Some(28.0),
                ..NutritionRecord::named("Mixed Food")
            },
        ])) as Arc<dyn NutritionSource>;

        let agent = Arc::new(fakes::ScriptedAgent::replying(
            r#"{"recommendations":[{"item":"Toor Dal with Rice","calories":450,"mealType":"lunch"}]}"#,
        )) as Arc<dyn RecommendationAgent>;

        Self::from_parts(config, ClassifierHandle::unavailable(), nutrition, agent)
    }
}

#[cfg(test)]
pub mod fakes {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::predictions::classifier::{FoodClassifier, RawPrediction};
    use crate::recommendations::agent::{AgentReply, RecommendationAgent};

    /// Classifier that remembers which files it was shown.
    pub struct FakeClassifier {
        result: Result<Vec<RawPrediction>, String>,
        paths: Mutex<Vec<PathBuf>>,
        contents: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeClassifier {
        pub fn ok(labels: Vec<(&str, f64)>) -> Self {
            let preds = labels
                .into_iter()
                .map(|(name, probability)| RawPrediction {
                    class_name: Some(name.to_lowercase().replace(' ', "_")),
                    display_name: Some(name.to_string()),
                    probability,
                    is_custom: true,
                })
                .collect();
            Self::with_result(Ok(preds))
        }

        pub fn failing(msg: &str) -> Self {
            Self::with_result(Err(msg.to_string()))
        }

        fn with_result(result: Result<Vec<RawPrediction>, String>) -> Self {
            Self {
                result,
                paths: Mutex::new(Vec::new()),
                contents: Mutex::new(Vec::new()),
            }
        }

        pub fn seen_paths(&self) -> Vec<PathBuf> {
            self.paths.lock().unwrap().clone()
        }

        pub fn seen_contents(&self) -> Vec<Vec<u8>> {
            self.contents.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FoodClassifier for FakeClassifier {
        async fn predict(&self, image_path: &Path) -> anyhow::Result<Vec<RawPrediction>> {
            self.paths.lock().unwrap().push(image_path.to_path_buf());
            self.contents
                .lock()
                .unwrap()
                .push(std::fs::read(image_path).unwrap_or_default());
            self.result.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    /// Agent with a canned answer.
    pub struct ScriptedAgent {
        reply: Result<String, String>,
        tool_log: Vec<String>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedAgent {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                tool_log: Vec::new(),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        pub fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                ..Self::replying("")
            }
        }

        pub fn with_tool_log(mut self, log: Vec<String>) -> Self {
            self.tool_log = log;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecommendationAgent for ScriptedAgent {
        async fn invoke(&self, prompt: &str) -> anyhow::Result<AgentReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            match &self.reply {
                Ok(content) => Ok(AgentReply {
                    content: content.clone(),
                    tool_log: self.tool_log.clone(),
                }),
                Err(e) => Err(anyhow::anyhow!(e.clone())),
            }
        }
    }
}
