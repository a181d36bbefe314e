use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::record::NutritionRecord;

#[derive(Debug, Deserialize)]
pub struct NutritionRequest {
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<Number>, // grams, default 100
}

#[derive(Debug, Serialize)]
pub struct NutritionResponse {
    pub success: bool,
    pub nutrition: NutritionRecord,
    /// Echoed as sent.
    pub quantity: Number,
}
