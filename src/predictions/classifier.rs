use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// One ranked label as produced by the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPrediction {
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub is_custom: bool,
}

impl RawPrediction {
    /// Human readable label: display name, then class name, then "Unknown".
    pub fn label(&self) -> &str {
        [&self.display_name, &self.class_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

#[async_trait]
pub trait FoodClassifier: Send + Sync {
    /// Classify the image stored at `image_path`, best match first.
    async fn predict(&self, image_path: &Path) -> anyhow::Result<Vec<RawPrediction>>;
}

/// Classifier slot of the application context. Decided once at startup.
#[derive(Clone, Default)]
pub struct ClassifierHandle {
    inner: Option<Arc<dyn FoodClassifier>>,
}

impl ClassifierHandle {
    pub fn available(classifier: Arc<dyn FoodClassifier>) -> Self {
        Self {
            inner: Some(classifier),
        }
    }

    pub fn unavailable() -> Self {
        Self { inner: None }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self) -> Option<&Arc<dyn FoodClassifier>> {
        self.inner.as_ref()
    }
}

/// Classifier served by an external inference process over HTTP.
#[derive(Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    /// Probes `GET {base_url}/health`; fails when the inference server is not up.
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();
        client
            .get(format!("{}/health", base_url))
            .send()
            .await
            .context("classifier health probe")?
            .error_for_status()
            .context("classifier health status")?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl FoodClassifier for HttpClassifier {
    async fn predict(&self, image_path: &Path) -> anyhow::Result<Vec<RawPrediction>> {
        let bytes = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("read image {}", image_path.display()))?;
        debug!(size = bytes.len(), "sending image to classifier");

        let part = Part::bytes(bytes)
            .file_name("image.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new().part("image", part);

        let resp = self
            .client
            .post(format!("{}/predict", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("classifier predict request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("classifier returned {}: {}", status, body);
        }

        resp.json::<Vec<RawPrediction>>()
            .await
            .context("decode classifier predictions")
    }
}

/// Builds the classifier handle once. Any failure leaves it unavailable for
/// the lifetime of the process.
pub async fn init_classifier(url: Option<&str>) -> ClassifierHandle {
    let Some(url) = url else {
        warn!("CLASSIFIER_URL not set; serving fallback predictions");
        return ClassifierHandle::unavailable();
    };
    match HttpClassifier::connect(url).await {
        Ok(c) => {
            info!(%url, "food classifier initialized");
            ClassifierHandle::available(Arc::new(c))
        }
        Err(e) => {
            warn!(error = %e, %url, "classifier init failed; serving fallback predictions");
            ClassifierHandle::unavailable()
        }
    }
}
