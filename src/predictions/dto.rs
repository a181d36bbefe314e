use serde::{Deserialize, Serialize};

use crate::nutrition::record::NutritionRecord;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub image: Option<String>, // base64, optionally a data URL
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub name: String,
    pub confidence: f64,
    pub is_custom_model: bool,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub predictions: Vec<PredictionResult>,
}

#[derive(Debug, Serialize)]
pub struct TopPrediction {
    pub name: String,
    pub confidence: f64,
    pub nutrition: Option<NutritionRecord>,
}

#[derive(Debug, Serialize)]
pub struct PredictWithNutritionResponse {
    pub success: bool,
    pub predictions: Vec<PredictionResult>,
    pub top_prediction: TopPrediction,
}
