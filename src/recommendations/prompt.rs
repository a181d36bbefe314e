use serde_json::{Map, Value};

use super::dto::FoodLogEntry;

/// User message handed to the agent. Same inputs, same prompt.
pub fn build_prompt(
    logs: &[FoodLogEntry],
    preferences: Option<&[Map<String, Value>]>,
) -> serde_json::Result<String> {
    let logs_json = serde_json::to_string_pretty(logs)?;
    let prefs_json = serde_json::to_string(preferences.unwrap_or(&[]))?;

    Ok(format!(
        r#"You are a practical food recommendation agent. Your goal is to analyze my recent eating patterns and provide 3 SIMPLE, everyday meal recommendations.

IMPORTANT: Think basic home cooking.

Process:
1. First, analyze my recent food logs for nutritional gaps
2. Look at seasonal ingredients for fresh options
3. Use your tools for guidance, then USE YOUR OWN KNOWLEDGE to suggest actual simple dish names
4. Provide 3 practical meal recommendations

Guidelines:
- NO fancy names or creative fusion dishes
- Focus on basic, commonly available ingredients
- Use your knowledge of Indian and international simple foods
- DON'T just copy from tool examples - think of real dishes
- Consider nutritional balance but keep it simple
- Avoid foods they've eaten recently

Recent food logs: {logs_json}
User preferences: {prefs_json}

Tools are for guidance only - use your actual knowledge of simple foods to make specific recommendations.

Final output should be exactly 3 SIMPLE recommendations in this JSON format:
{{
  "recommendations": [
    {{
      "item": "Simple dish name",
      "calories": estimated_calories_integer,
      "mealType": "breakfast|lunch|dinner|snack",
      "date": "YYYY-MM-DD",
      "quantity": 1.0,
      "reasoning": "Brief explanation of why this simple meal makes sense"
    }}
  ]
}}

Please use your available tools for analysis, then use YOUR KNOWLEDGE to suggest food names."#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::dto::MealType;
    use serde_json::json;
    use time::macros::date;

    fn logs() -> Vec<FoodLogEntry> {
        vec![FoodLogEntry {
            name: "Poha".into(),
            calories: 250,
            meal_type: MealType::Breakfast,
            date: date!(2024 - 06 - 03),
            quantity: 1.0,
        }]
    }

    #[test]
    fn embeds_logs_preferences_and_output_shape() {
        let prefs = vec![json!({"diet": "vegetarian"}).as_object().unwrap().clone()];
        let prompt = build_prompt(&logs(), Some(prefs.as_slice())).unwrap();
        assert!(prompt.contains(r#""name": "Poha""#));
        assert!(prompt.contains(r#""mealType": "breakfast""#));
        assert!(prompt.contains(r#""date": "2024-06-03""#));
        assert!(prompt.contains(r#"User preferences: [{"diet":"vegetarian"}]"#));
        assert!(prompt.contains("exactly 3 SIMPLE recommendations"));
        assert!(prompt.contains("\"recommendations\": ["));
    }

    #[test]
    fn is_deterministic_and_defaults_preferences() {
        let a = build_prompt(&logs(), None).unwrap();
        let b = build_prompt(&logs(), None).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("User preferences: []"));
    }
}
