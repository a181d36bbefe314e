use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

/// One food the user logged recently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLogEntry {
    pub name: String,
    pub calories: i64,
    pub meal_type: MealType,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub quantity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub logs: Vec<FoodLogEntry>,
    #[serde(default)]
    pub preferences: Option<Vec<Map<String, Value>>>, // opaque dietary preferences
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub item: String,
    pub calories: i64,
    pub meal_type: String,
    pub date: String,
    pub reasoning: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRecommendationsResponse {
    pub success: bool,
    pub message: String,
    pub recommendations: Vec<RecommendationItem>,
    pub session_id: String,
    pub agent_logs: Option<Vec<String>>,
}

impl GenerateRecommendationsResponse {
    pub fn failure(message: impl Into<String>, session_id: String, agent_logs: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            recommendations: Vec::new(),
            session_id,
            agent_logs,
        }
    }
}
