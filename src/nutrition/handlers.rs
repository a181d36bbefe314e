use axum::{extract::State, routing::post, Json, Router};
use serde_json::Number;
use tracing::{error, info, instrument, warn};

use super::dto::{NutritionRequest, NutritionResponse};
use super::services::{lookup_scaled, DEFAULT_QUANTITY_G};
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/nutrition", post(get_nutrition))
}

/// POST /nutrition { food_name, quantity? }
#[instrument(skip(state, body))]
pub async fn get_nutrition(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NutritionRequest>,
) -> Result<Json<NutritionResponse>, ApiError> {
    let food_name = body
        .food_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            warn!("request without food_name");
            ApiError::BadRequest("No food name provided".into())
        })?;
    let quantity = body
        .quantity
        .unwrap_or_else(|| Number::from(DEFAULT_QUANTITY_G));
    let grams = quantity
        .as_f64()
        .ok_or_else(|| ApiError::BadRequest("Invalid quantity".into()))?;

    let nutrition = lookup_scaled(state.nutrition.as_ref(), food_name, grams)
        .await
        .map_err(|e| {
            error!(error = %e, food = %food_name, "nutrition lookup failed");
            ApiError::from(e)
        })?
        .ok_or_else(|| {
            info!(food = %food_name, "nutrition not found");
            ApiError::NotFound("Nutrition data not found".into())
        })?;

    Ok(Json(NutritionResponse {
        success: true,
        nutrition,
        quantity,
    }))
}
