use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{PredictRequest, PredictResponse, PredictWithNutritionResponse, TopPrediction};
use super::services;
use crate::error::{ApiError, ApiJson};
use crate::{nutrition::services::lookup, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict_with_nutrition", post(predict_with_nutrition))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

fn require_image(body: &PredictRequest) -> Result<&str, ApiError> {
    body.image
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            warn!("request without image");
            ApiError::BadRequest("No image data provided".into())
        })
}

/// POST /predict { image: "<base64>" }
#[instrument(skip(state, body))]
pub async fn predict(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let image = require_image(&body)?;

    let predictions = services::predict(&state.classifier, image)
        .await
        .map_err(|e| {
            error!(error = %e, "prediction failed");
            ApiError::from(e)
        })?;

    info!(count = predictions.len(), "prediction served");
    Ok(Json(PredictResponse {
        success: true,
        predictions,
    }))
}

/// POST /predict_with_nutrition { image: "<base64>" }
#[instrument(skip(state, body))]
pub async fn predict_with_nutrition(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PredictRequest>,
) -> Result<Json<PredictWithNutritionResponse>, ApiError> {
    let image = require_image(&body)?;

    let predictions = services::predict(&state.classifier, image)
        .await
        .map_err(|e| {
            error!(error = %e, "prediction failed");
            ApiError::from(e)
        })?;

    let top_prediction = match predictions.first() {
        Some(top) => {
            let nutrition = match lookup(state.nutrition.as_ref(), &top.name).await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, food = %top.name, "nutrition lookup failed");
                    None
                }
            };
            TopPrediction {
                name: top.name.clone(),
                confidence: top.confidence,
                nutrition,
            }
        }
        None => TopPrediction {
            name: String::new(),
            confidence: 0.0,
            nutrition: None,
        },
    };

    info!(
        count = predictions.len(),
        top = %top_prediction.name,
        has_nutrition = top_prediction.nutrition.is_some(),
        "prediction with nutrition served"
    );
    Ok(Json(PredictWithNutritionResponse {
        success: true,
        predictions,
        top_prediction,
    }))
}
