use time::{macros::format_description, Duration, OffsetDateTime};
use tracing::{error, info, warn};

use super::agent::RecommendationAgent;
use super::dto::{GenerateRecommendationsResponse, RecommendationRequest};
use super::extract::parse_recommendations;
use super::prompt::build_prompt;

pub fn session_id(now: OffsetDateTime) -> String {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    format!("api_{}", now.format(fmt).unwrap_or_default())
}

/// Tomorrow relative to `now`, `YYYY-MM-DD`.
pub fn tomorrow(now: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    (now.date() + Duration::days(1))
        .format(fmt)
        .unwrap_or_default()
}

/// Single pass: validate, prompt, invoke the agent once, extract. Every
/// failure comes back as `success = false` with a reason.
pub async fn generate_recommendations(
    agent: &dyn RecommendationAgent,
    req: &RecommendationRequest,
    now: OffsetDateTime,
) -> GenerateRecommendationsResponse {
    let session_id = session_id(now);

    if req.logs.is_empty() {
        warn!(%session_id, "no food logs in request");
        return GenerateRecommendationsResponse::failure("no logs provided", session_id, None);
    }
    info!(
        %session_id,
        request_date = %req.date,
        logs = req.logs.len(),
        "generating recommendations"
    );

    let prompt = match build_prompt(&req.logs, req.preferences.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, %session_id, "prompt build failed");
            return GenerateRecommendationsResponse::failure(
                format!("agent invocation error: {}", e),
                session_id,
                None,
            );
        }
    };

    let reply = match agent.invoke(&prompt).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, %session_id, "agent invocation failed");
            return GenerateRecommendationsResponse::failure(
                format!("agent invocation error: {:#}", e),
                session_id,
                None,
            );
        }
    };
    let agent_logs = Some(reply.tool_log);

    let recommendations = match parse_recommendations(&reply.content, &tomorrow(now)) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, %session_id, "agent response did not parse");
            return GenerateRecommendationsResponse::failure(
                format!("parse error: {}", e),
                session_id,
                agent_logs,
            );
        }
    };

    if recommendations.is_empty() {
        warn!(%session_id, "agent returned no usable recommendations");
        return GenerateRecommendationsResponse::failure(
            "no valid recommendations returned",
            session_id,
            agent_logs,
        );
    }

    info!(%session_id, count = recommendations.len(), "recommendations generated");
    GenerateRecommendationsResponse {
        success: true,
        message: format!(
            "Successfully generated {} recommendations",
            recommendations.len()
        ),
        recommendations,
        session_id,
        agent_logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::dto::{FoodLogEntry, MealType};
    use crate::state::fakes::ScriptedAgent;
    use time::macros::{date, datetime};

    const NOW: OffsetDateTime = datetime!(2024-06-03 18:30:05 UTC);

    fn request(logs: Vec<FoodLogEntry>) -> RecommendationRequest {
        RecommendationRequest {
            date: date!(2024 - 06 - 03),
            logs,
            preferences: None,
        }
    }

    fn one_log() -> Vec<FoodLogEntry> {
        vec![FoodLogEntry {
            name: "Rajma Chawal".into(),
            calories: 520,
            meal_type: MealType::Lunch,
            date: date!(2024 - 06 - 03),
            quantity: 1.0,
        }]
    }

    #[test]
    fn session_and_tomorrow_formats() {
        assert_eq!(session_id(NOW), "api_20240603_183005");
        assert_eq!(tomorrow(NOW), "2024-06-04");
        assert_eq!(tomorrow(datetime!(2024-12-31 23:00 UTC)), "2025-01-01");
    }

    #[tokio::test]
    async fn empty_logs_fail_softly_without_calling_agent() {
        let agent = ScriptedAgent::replying("{}");
        let resp = generate_recommendations(&agent, &request(vec![]), NOW).await;
        assert!(!resp.success);
        assert_eq!(resp.message, "no logs provided");
        assert!(resp.recommendations.is_empty());
        assert_eq!(agent.calls(), 0);
    }

    #[tokio::test]
    async fn happy_path_maps_items_and_defaults_date_to_tomorrow() {
        let agent = ScriptedAgent::replying(
            r#"Based on the analysis, here are my picks:
{"recommendations": [
  {"item": "Palak Dal", "calories": 300, "mealType": "dinner", "quantity": 1.0, "reasoning": "greens"},
  {"item": "", "calories": 10},
  {"item": "Fruit Bowl", "calories": 150, "mealType": "snack", "date": "2024-06-05", "reasoning": "fruit"},
  {"item": "Egg Bhurji", "calories": 280, "mealType": "breakfast", "reasoning": "protein"},
  {"item": "   ", "calories": 10}
]}
Enjoy {your meals}!"#,
        )
        .with_tool_log(vec!["called get_seasonal_ingredients({})".into()]);

        let resp = generate_recommendations(&agent, &request(one_log()), NOW).await;
        assert!(resp.success, "{}", resp.message);
        assert_eq!(resp.message, "Successfully generated 3 recommendations");
        assert_eq!(resp.recommendations.len(), 3);
        assert_eq!(resp.recommendations[0].date, "2024-06-04");
        assert_eq!(resp.recommendations[1].date, "2024-06-05");
        assert_eq!(resp.session_id, "api_20240603_183005");
        assert_eq!(resp.agent_logs.as_ref().unwrap().len(), 1);
        assert_eq!(agent.calls(), 1);
        assert!(agent.last_prompt().unwrap().contains("Rajma Chawal"));
    }

    #[tokio::test]
    async fn agent_error_is_reported() {
        let agent = ScriptedAgent::failing("rate limited");
        let resp = generate_recommendations(&agent, &request(one_log()), NOW).await;
        assert!(!resp.success);
        assert!(resp.message.starts_with("agent invocation error: "));
        assert!(resp.message.contains("rate limited"));
    }

    #[tokio::test]
    async fn unparseable_reply_is_a_parse_error() {
        let agent = ScriptedAgent::replying("I could not decide, sorry.");
        let resp = generate_recommendations(&agent, &request(one_log()), NOW).await;
        assert!(!resp.success);
        assert!(resp.message.starts_with("parse error: "));
        assert!(resp.recommendations.is_empty());
    }

    #[tokio::test]
    async fn zero_usable_items_is_reported() {
        let agent = ScriptedAgent::replying(r#"{"recommendations": [{"item": ""}]}"#);
        let resp = generate_recommendations(&agent, &request(one_log()), NOW).await;
        assert!(!resp.success);
        assert_eq!(resp.message, "no valid recommendations returned");
    }
}
