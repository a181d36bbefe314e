//! Deterministic helper functions the recommendation agent may call.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use super::dto::MealType;

lazy_static! {
    static ref VEGETABLES_RE: Regex = Regex::new(r"salad|vegetable|broccoli|spinach").unwrap();
    static ref PROTEIN_RE: Regex = Regex::new(r"chicken|fish|egg|bean|tofu").unwrap();
    static ref PROCESSED_RE: Regex = Regex::new(r"pizza|burger|fries|chips").unwrap();
    static ref FRUITS_RE: Regex = Regex::new(r"apple|banana|berry|fruit").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AnalyzeNutritionGaps,
    SearchRecipeIdeas,
    GetSeasonalIngredients,
    BrainstormSimpleMeals,
}

impl Tool {
    pub const ALL: [Tool; 4] = [
        Tool::AnalyzeNutritionGaps,
        Tool::SearchRecipeIdeas,
        Tool::GetSeasonalIngredients,
        Tool::BrainstormSimpleMeals,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::AnalyzeNutritionGaps => "analyze_nutrition_gaps",
            Tool::SearchRecipeIdeas => "search_recipe_ideas",
            Tool::GetSeasonalIngredients => "get_seasonal_ingredients",
            Tool::BrainstormSimpleMeals => "brainstorm_simple_meals",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::AnalyzeNutritionGaps => "Analyze nutritional gaps in recent eating patterns",
            Tool::SearchRecipeIdeas => {
                "Get guidance for recipe types, but agent should be creative within these constraints"
            }
            Tool::GetSeasonalIngredients => {
                "Get seasonal ingredients for current month to suggest fresh options"
            }
            Tool::BrainstormSimpleMeals => {
                "Use your knowledge to brainstorm simple meal ideas based on nutrition focus"
            }
        }
    }

    /// JSON schema of the arguments object.
    pub fn parameters(&self) -> Value {
        let single = |name: &str, desc: &str| {
            json!({
                "type": "object",
                "properties": { name: { "type": "string", "description": desc } },
                "required": [name]
            })
        };
        match self {
            Tool::AnalyzeNutritionGaps => {
                single("food_logs_json", "The recent food logs as a JSON array string")
            }
            Tool::SearchRecipeIdeas => single(
                "cuisine_type",
                "One of indian, healthy, protein, vegetables, comfort",
            ),
            Tool::GetSeasonalIngredients => json!({ "type": "object", "properties": {} }),
            Tool::BrainstormSimpleMeals => single(
                "nutrition_focus",
                "One of vegetables, protein, balanced, variety",
            ),
        }
    }

    /// OpenAI-style function definition.
    pub fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }

    /// Run the tool. `month` is the current calendar month (1-12).
    pub fn call(&self, args: &Value, month: u8) -> String {
        let text_arg = |key: &str| args.get(key).and_then(Value::as_str).unwrap_or("");
        match self {
            Tool::AnalyzeNutritionGaps => {
                let logs = match args.get("food_logs_json") {
                    Some(Value::String(s)) => serde_json::from_str::<Vec<Value>>(s).unwrap_or_default(),
                    Some(Value::Array(a)) => a.clone(),
                    _ => Vec::new(),
                };
                let gaps = analyze_nutrition_gaps(&logs);
                serde_json::to_string_pretty(&gaps).unwrap_or_default()
            }
            Tool::SearchRecipeIdeas => search_recipe_ideas(text_arg("cuisine_type")),
            Tool::GetSeasonalIngredients => seasonal_report(month),
            Tool::BrainstormSimpleMeals => brainstorm_simple_meals(text_arg("nutrition_focus")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionGaps {
    pub total_logs: usize,
    pub total_calories: i64,
    pub avg_daily_calories: f64,
    pub missing_vegetables: bool,
    pub low_protein: bool,
    pub high_processed: bool,
    pub missing_breakfast: bool,
    pub missing_fruits: bool,
    pub meal_distribution: BTreeMap<&'static str, usize>,
}

/// Keyword heuristics over loosely typed log objects.
pub fn analyze_nutrition_gaps(logs: &[Value]) -> NutritionGaps {
    let calories = |log: &Value| match log.get("calories") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        _ => 0,
    };
    let text = |log: &Value, key: &str| {
        log.get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let total_calories = logs.iter().map(calories).fold(0i64, i64::saturating_add);
    let meal_types: Vec<String> = logs.iter().map(|l| text(l, "mealType")).collect();
    let names: Vec<String> = logs.iter().map(|l| text(l, "name").to_lowercase()).collect();
    let days: BTreeSet<String> = logs.iter().map(|l| text(l, "date")).collect();

    let processed = names.iter().filter(|n| PROCESSED_RE.is_match(n)).count();

    NutritionGaps {
        total_logs: logs.len(),
        total_calories,
        avg_daily_calories: total_calories as f64 / days.len().max(1) as f64,
        missing_vegetables: !names.iter().any(|n| VEGETABLES_RE.is_match(n)),
        low_protein: !names.iter().any(|n| PROTEIN_RE.is_match(n)),
        high_processed: processed as f64 > names.len() as f64 * 0.3,
        missing_breakfast: !meal_types.iter().any(|m| m == "breakfast"),
        missing_fruits: !names.iter().any(|n| FRUITS_RE.is_match(n)),
        meal_distribution: MealType::ALL
            .iter()
            .map(|m| (m.as_str(), meal_types.iter().filter(|t| *t == m.as_str()).count()))
            .collect(),
    }
}

pub fn search_recipe_ideas(cuisine_type: &str) -> String {
    let guidance = match cuisine_type.trim().to_lowercase().as_str() {
        "indian" => "Simple Indian home-style dishes like dal, sabzi, curry, rice dishes, roti meals",
        "protein" => "Simple protein-rich dishes like egg curry, chicken dishes, dal, paneer meals",
        "vegetables" => "Basic vegetable dishes - sabzi, simple curries, vegetable rice",
        "comfort" => "Everyday comfort foods like khichdi, simple curries, basic rice dishes",
        _ => "Basic healthy meals with vegetables, lean proteins, whole grains - nothing fancy",
    };
    format!(
        "Recipe guidance for {cuisine_type}:\n\
         {guidance}\n\
         \n\
         IMPORTANT: Don't just copy these words - use your knowledge to suggest ACTUAL simple dish names that fit this category. Think of real, everyday foods people cook at home.\n\
         \n\
         Examples of the style I want:\n\
         - \"Toor Dal with Rice\"\n\
         - \"Aloo Sabzi with Roti\"\n\
         - \"Chicken Curry with Rice\"\n\
         \n\
         Be specific with actual dish names, but keep them SIMPLE and NORMAL."
    )
}

/// Seasonal produce for `month`; anything outside 1-12 gets June's list.
pub fn seasonal_ingredients(month: u8) -> [&'static str; 5] {
    const WINTER: [&str; 5] = [
        "citrus fruits",
        "winter squash",
        "kale",
        "collard greens",
        "pomegranates",
    ];
    match month {
        1 | 2 | 12 => WINTER,
        3 => ["asparagus", "artichokes", "peas", "spring onions", "strawberries"],
        4 => ["asparagus", "strawberries", "spring greens", "radishes", "peas"],
        5 => ["strawberries", "asparagus", "lettuce", "spinach", "spring herbs"],
        7 => ["tomatoes", "berries", "corn", "peaches", "cucumber"],
        8 => ["tomatoes", "peaches", "corn", "eggplant", "bell peppers"],
        9 => ["apples", "winter squash", "brussels sprouts", "pears", "sweet potatoes"],
        10 => ["pumpkin", "apples", "sweet potatoes", "brussels sprouts", "cranberries"],
        11 => ["cranberries", "sweet potatoes", "winter squash", "pomegranates", "pears"],
        _ => ["berries", "tomatoes", "zucchini", "bell peppers", "fresh herbs"],
    }
}

fn seasonal_report(month: u8) -> String {
    let seasonal = seasonal_ingredients(month);
    let report = json!({
        "month": month,
        "seasonal_ingredients": seasonal,
        "suggestion": format!(
            "Try incorporating these fresh, seasonal ingredients: {}",
            seasonal[..3].join(", ")
        ),
    });
    serde_json::to_string_pretty(&report).unwrap_or_default()
}

pub fn brainstorm_simple_meals(nutrition_focus: &str) -> String {
    let guidance = match nutrition_focus.trim().to_lowercase().as_str() {
        "vegetables" => "Think of simple ways to add more vegetables - basic sabzis, vegetable rice, simple salads",
        "protein" => "Consider everyday protein sources - eggs, dal, chicken, paneer, fish - in simple preparations",
        "variety" => "Consider different meal types to break monotony - different cuisines but simple versions",
        _ => "Think of complete, balanced meals that are easy to make at home",
    };
    format!(
        "Brainstorming guidance for {nutrition_focus} meals:\n\
         \n\
         {guidance}\n\
         \n\
         Now use your knowledge of Indian and international simple foods to suggest actual dish names. Remember:\n\
         - Keep it SIMPLE and homestyle\n\
         - Use common ingredients\n\
         - Think of what people actually cook daily\n\
         - Examples: \"Moong Dal Tadka\", \"Aloo Jeera\", \"Egg Bhurji\", \"Simple Chicken Curry\"\n\
         \n\
         Don't just repeat examples - use your knowledge to suggest real, simple dishes that fit the nutrition focus."
    )
}
