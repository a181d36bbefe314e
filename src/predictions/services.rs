use std::io::Write;
use std::path::Path;

use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::classifier::{ClassifierHandle, FoodClassifier, RawPrediction};
use super::dto::PredictionResult;

pub const MAX_PREDICTIONS: usize = 5;

const FALLBACK: [(&str, f64); 5] = [
    ("Mixed Food", 0.8),
    ("Indian Cuisine", 0.6),
    ("Rice Dish", 0.5),
    ("Curry", 0.4),
    ("Vegetable Dish", 0.3),
];

/// Canned predictions served while no classifier is available.
pub fn fallback_predictions() -> Vec<PredictionResult> {
    FALLBACK
        .iter()
        .map(|(name, confidence)| PredictionResult {
            name: (*name).to_string(),
            confidence: *confidence,
            is_custom_model: false,
        })
        .collect()
}

/// Drops a `data:image/...;base64,` style prefix.
pub fn strip_data_url(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(',') {
            return payload;
        }
    }
    trimmed
}

pub fn decode_image(encoded: &str) -> anyhow::Result<Bytes> {
    let payload: String = strip_data_url(encoded)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let raw = Base64::decode_vec(&payload)
        .map_err(|e| anyhow::anyhow!("invalid base64 image data: {}", e))?;
    anyhow::ensure!(!raw.is_empty(), "decoded image is empty");
    Ok(Bytes::from(raw))
}

/// Image bytes parked in a uniquely named temp file; removed on drop.
pub struct ScopedImage {
    file: NamedTempFile,
}

impl ScopedImage {
    /// Stages `bytes` on a blocking thread so the executor never waits on disk.
    pub async fn stage(bytes: Bytes) -> anyhow::Result<Self> {
        tokio::task::spawn_blocking(move || Self::write(&bytes))
            .await
            .context("temp image writer panicked")?
    }

    fn write(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("fitdiet-")
            .suffix(".jpg")
            .tempfile()
            .context("create temp image")?;
        file.write_all(bytes).context("write temp image")?;
        file.flush().context("flush temp image")?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Decode, park on disk, classify. The temp file is gone once this returns,
/// whatever the classifier did.
pub async fn classify(
    classifier: &dyn FoodClassifier,
    encoded: &str,
) -> anyhow::Result<Vec<RawPrediction>> {
    let bytes = decode_image(encoded)?;
    let size = bytes.len();
    let image = ScopedImage::stage(bytes).await?;
    debug!(path = %image.path().display(), size, "image staged");
    let result = classifier.predict(image.path()).await;
    drop(image);
    result
}

pub fn format_predictions(raw: &[RawPrediction]) -> Vec<PredictionResult> {
    raw.iter()
        .take(MAX_PREDICTIONS)
        .map(|p| PredictionResult {
            name: p.label().to_string(),
            confidence: p.probability,
            is_custom_model: p.is_custom,
        })
        .collect()
}

/// Top predictions for an encoded image, or the fallback list when the
/// classifier is not available.
pub async fn predict(
    handle: &ClassifierHandle,
    encoded: &str,
) -> anyhow::Result<Vec<PredictionResult>> {
    let Some(classifier) = handle.get() else {
        info!("classifier unavailable; returning fallback predictions");
        return Ok(fallback_predictions());
    };
    let raw = classify(classifier.as_ref(), encoded).await?;
    Ok(format_predictions(&raw))
}

#[cfg(test)]
mod prediction_tests {
    use super::*;
    use crate::state::fakes::FakeClassifier;
    use std::sync::Arc;

    // "hello" in base64
    const HELLO: &str = "aGVsbG8=";

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
        assert_eq!(strip_data_url("  QUJD\n"), "QUJD");
    }

    #[test]
    fn decode_accepts_data_url_and_wrapped_lines() {
        let bytes = decode_image(&format!("data:image/jpeg;base64,{}", HELLO)).unwrap();
        assert_eq!(&bytes[..], b"hello");

        let bytes = decode_image("aGVs\nbG8=").unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image("***not base64***").is_err());
        assert!(decode_image("").is_err());
    }

    #[test]
    fn fallback_is_five_fixed_entries() {
        let preds = fallback_predictions();
        assert_eq!(preds.len(), 5);
        assert_eq!(preds[0].name, "Mixed Food");
        assert_eq!(preds[0].confidence, 0.8);
        assert_eq!(preds[4].name, "Vegetable Dish");
        assert!(preds.iter().all(|p| !p.is_custom_model));
    }

    #[test]
    fn format_keeps_classifier_order_and_caps_at_five() {
        let raw: Vec<RawPrediction> = (0..7)
            .map(|i| RawPrediction {
                class_name: Some(format!("c{}", i)),
                display_name: None,
                // deliberately unsorted
                probability: if i == 1 { 0.9 } else { 0.1 },
                is_custom: i % 2 == 0,
            })
            .collect();
        let out = format_predictions(&raw);
        assert_eq!(out.len(), MAX_PREDICTIONS);
        assert_eq!(out[0].name, "c0");
        assert_eq!(out[1].confidence, 0.9);
        assert!(out[0].is_custom_model);
        assert!(!out[1].is_custom_model);
    }

    #[tokio::test]
    async fn predict_without_classifier_serves_fallback_without_decoding() {
        let preds = predict(&ClassifierHandle::unavailable(), "not even base64")
            .await
            .unwrap();
        assert_eq!(preds, fallback_predictions());
    }

    #[tokio::test]
    async fn temp_image_removed_after_success() {
        let fake = Arc::new(FakeClassifier::ok(vec![("Toor Dal", 0.7)]));
        let handle = ClassifierHandle::available(fake.clone());

        let preds = predict(&handle, HELLO).await.unwrap();
        assert_eq!(preds[0].name, "Toor Dal");

        let seen = fake.seen_paths();
        assert_eq!(seen.len(), 1);
        assert_eq!(fake.seen_contents()[0], b"hello".to_vec());
        assert!(!seen[0].exists());
    }

    #[tokio::test]
    async fn temp_image_removed_after_failure() {
        let fake = Arc::new(FakeClassifier::failing("boom"));
        let handle = ClassifierHandle::available(fake.clone());

        let err = predict(&handle, HELLO).await.unwrap_err();
        assert!(err.to_string().contains("boom"));

        let seen = fake.seen_paths();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].exists());
    }

    #[tokio::test]
    async fn staged_image_lives_until_dropped() {
        let image = ScopedImage::stage(Bytes::from_static(b"hello")).await.unwrap();
        let path = image.path().to_path_buf();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello".to_vec());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("fitdiet-"));

        drop(image);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn each_request_gets_its_own_file() {
        let fake = Arc::new(FakeClassifier::ok(vec![("Curry", 0.5)]));
        let handle = ClassifierHandle::available(fake.clone());

        predict(&handle, HELLO).await.unwrap();
        predict(&handle, HELLO).await.unwrap();

        let seen = fake.seen_paths();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
    }
}
