use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_steps: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub classifier_url: Option<String>,
    pub nutrition_csv_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let llm = LlmConfig {
            api_key: std::env::var("GROQ_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .context("GROQ_API_KEY environment variable not set")?,
            model: std::env::var("GROQ_MODEL")
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|_| "moonshotai/kimi-k2-instruct-0905".into()),
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".into()),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.7),
            max_steps: std::env::var("AGENT_MAX_STEPS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(6),
        };
        let classifier_url = std::env::var("CLASSIFIER_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        let nutrition_csv_path = std::env::var("NUTRITION_CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("assets/data/usda_slim.csv"));

        Ok(Self {
            llm,
            classifier_url,
            nutrition_csv_path,
        })
    }
}
