use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{instrument, warn};

use super::dto::{GenerateRecommendationsResponse, RecommendationRequest};
use super::services::{generate_recommendations, session_id};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/recommendations/generate", post(generate))
}

/// POST /recommendations/generate. Always 200; failures, including bodies
/// that do not deserialize, are in the body.
#[instrument(skip(state, body))]
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Json<GenerateRecommendationsResponse> {
    let now = OffsetDateTime::now_utc();
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let detail = rejection.body_text();
            warn!(error = %detail, "invalid recommendation request");
            return Json(GenerateRecommendationsResponse::failure(
                format!("invalid request: {}", detail),
                session_id(now),
                None,
            ));
        }
    };
    Json(generate_recommendations(state.agent.as_ref(), &body, now).await)
}
