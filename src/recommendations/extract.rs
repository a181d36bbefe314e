//! Pulls the recommendation JSON out of the agent's free-text answer.

use serde_json::Value;
use thiserror::Error;

use super::dto::RecommendationItem;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("no JSON object found in agent response")]
    NoObject,
    #[error("unbalanced braces in agent response")]
    Unbalanced,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("`recommendations` is not an array")]
    NotAnArray,
    #[error("recommendation {index}: invalid `{field}`")]
    InvalidField { index: usize, field: &'static str },
}

/// Returns the first brace-balanced `{...}` in `text`. Braces inside JSON
/// string literals are not counted.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoObject)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + idx + 1]);
                }
            }
            _ => {}
        }
    }
    Err(ExtractError::Unbalanced)
}

/// Parse the agent answer into recommendation items. Entries without a
/// non-empty `item` are dropped; `default_date` fills a missing `date`.
pub fn parse_recommendations(
    text: &str,
    default_date: &str,
) -> Result<Vec<RecommendationItem>, ExtractError> {
    let json = extract_json_object(text)?;
    let parsed: Value =
        serde_json::from_str(json).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let entries = match parsed.get("recommendations") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(a)) => a,
        Some(_) => return Err(ExtractError::NotAnArray),
    };

    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let item = entry
            .get("item")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        if item.is_empty() {
            continue;
        }

        let calories = coerce_int(entry.get("calories"))
            .ok_or(ExtractError::InvalidField { index, field: "calories" })?;
        let quantity = coerce_float(entry.get("quantity"))
            .ok_or(ExtractError::InvalidField { index, field: "quantity" })?;

        out.push(RecommendationItem {
            item: item.to_string(),
            calories,
            meal_type: coerce_text(entry.get("mealType")).unwrap_or_else(|| "snack".into()),
            date: coerce_text(entry.get("date")).unwrap_or_else(|| default_date.to_string()),
            reasoning: coerce_text(entry.get("reasoning")).unwrap_or_default(),
            quantity,
        });
    }
    Ok(out)
}

/// Missing -> 0, numbers truncate, numeric strings parse.
fn coerce_int(v: Option<&Value>) -> Option<i64> {
    match v {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Some(_) => None,
    }
}

/// Missing -> 1.0.
fn coerce_float(v: Option<&Value>) -> Option<f64> {
    match v {
        None | Some(Value::Null) => Some(1.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Some(_) => None,
    }
}

fn coerce_text(v: Option<&Value>) -> Option<String> {
    match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}
