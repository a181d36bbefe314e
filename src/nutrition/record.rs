use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Nutrient values for one food, per 100 g unless scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub food_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    /// Columns outside the standard set; numbers scale, everything else passes through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NutritionRecord {
    pub fn named(food_name: impl Into<String>) -> Self {
        Self {
            food_name: food_name.into(),
            energy_kcal: None,
            protein_g: None,
            fat_g: None,
            carbs_g: None,
            fiber_g: None,
            extra: Map::new(),
        }
    }

    /// Copy with every numeric field multiplied by `quantity / 100`.
    pub fn scaled(&self, quantity: f64) -> Self {
        let factor = quantity / 100.0;
        let scale = |v: Option<f64>| v.map(|x| x * factor);
        Self {
            food_name: self.food_name.clone(),
            energy_kcal: scale(self.energy_kcal),
            protein_g: scale(self.protein_g),
            fat_g: scale(self.fat_g),
            carbs_g: scale(self.carbs_g),
            fiber_g: scale(self.fiber_g),
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), scale_value(v, factor)))
                .collect(),
        }
    }
}

fn scale_value(v: &Value, factor: f64) -> Value {
    match v {
        Value::Number(n) => n
            .as_f64()
            .and_then(|x| Number::from_f64(x * factor))
            .map(Value::Number)
            .unwrap_or_else(|| v.clone()),
        other => other.clone(),
    }
}
