//! Client for the external meal-generation service.
//!
//! The service is reached through the `MealPlanApi` trait so handlers and
//! tests can swap in a fake. The HTTP implementation carries a bounded retry
//! with doubling backoff; the two response shapes the service is known to
//! produce are normalized into one canonical `MealPlanResponse` and anything
//! else fails closed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MealApiConfig;
use crate::dietplan::dto::MealType;
use crate::error::ApiError;

// --- request payload ---

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyNutrients {
    pub fats: i32,
    pub carbs: i32,
    pub protein: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MealFrequency {
    pub breakfast: u32,
    pub lunch: u32,
    pub dinner: u32,
    pub snack: u32,
    pub dessert: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DietaryPreferences {
    pub diet_type: String,
    pub avoid_foods: Vec<String>,
    pub preferred_cuisines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfilePayload {
    pub daily_calorie_target: i32,
    pub daily_nutrients: DailyNutrients,
    pub meal_frequency: MealFrequency,
    pub dietary_preferences: DietaryPreferences,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MealPlanRequest {
    pub user_profile: UserProfilePayload,
}

// --- canonical response ---

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedMeal {
    pub meal_type: MealType,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedDay {
    #[serde(default)]
    pub day: Option<i32>,
    pub meals: Vec<GeneratedMeal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanSummary {
    pub avg_daily_calories: f64,
    pub total_days: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealPlanResponse {
    pub meal_plan: Vec<GeneratedDay>,
    pub summary: PlanSummary,
}

/// The two wire shapes the service produces: the plan object directly, or the
/// same object under a double `data` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlanResponse {
    Direct(MealPlanResponse),
    Enveloped { data: EnvelopeInner },
}

#[derive(Debug, Deserialize)]
struct EnvelopeInner {
    data: MealPlanResponse,
}

/// Maps a raw response body into the canonical shape, failing closed on
/// anything unrecognized.
pub fn normalize_response(body: serde_json::Value) -> Result<MealPlanResponse, ApiError> {
    match serde_json::from_value::<RawPlanResponse>(body) {
        Ok(RawPlanResponse::Direct(plan)) => Ok(plan),
        Ok(RawPlanResponse::Enveloped { data }) => Ok(data.data),
        Err(e) => {
            warn!(error = %e, "meal plan response matched no known shape");
            Err(ApiError::InvalidResponseShape)
        }
    }
}

// --- transport ---

#[async_trait]
pub trait MealPlanApi: Send + Sync {
    async fn generate(&self, request: &MealPlanRequest) -> Result<MealPlanResponse, ApiError>;
}

pub struct HttpMealPlanClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpMealPlanClient {
    pub fn new(config: &MealApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        })
    }

    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// One POST attempt. `Ok(Err(_))` is a terminal failure, `Err(_)` is
    /// retryable.
    async fn attempt(
        &self,
        url: &str,
        request: &MealPlanRequest,
    ) -> Result<Result<MealPlanResponse, ApiError>, ApiError> {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::ExternalService(format!("unexpected status {status}"));
            if Self::is_retryable(status) {
                return Err(err);
            }
            return Ok(Err(err));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::ExternalService(format!("invalid json body: {e}")))?;

        // Shape mismatch is deterministic; retrying would not help.
        Ok(normalize_response(body))
    }
}

#[async_trait]
impl MealPlanApi for HttpMealPlanClient {
    async fn generate(&self, request: &MealPlanRequest) -> Result<MealPlanResponse, ApiError> {
        let url = format!("{}/generate-meal-plan", self.base_url);
        let mut backoff = self.initial_backoff;
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.attempt(&url, request).await {
                Ok(result) => {
                    if result.is_ok() {
                        debug!(attempt, "meal plan generated");
                    }
                    return result;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "meal plan request failed, will retry");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ApiError::ExternalService("retries exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn direct_body() -> serde_json::Value {
        json!({
            "meal_plan": [
                {
                    "day": 1,
                    "meals": [
                        {"meal_type": "breakfast", "title": "Oatmeal with Berries"},
                        {"meal_type": "dinner", "title": "Grilled Salmon"}
                    ]
                }
            ],
            "summary": {"avg_daily_calories": 2100.0, "total_days": 7}
        })
    }

    #[test]
    fn normalizes_direct_shape() {
        let plan = normalize_response(direct_body()).expect("direct shape");
        assert_eq!(plan.meal_plan.len(), 1);
        assert_eq!(plan.meal_plan[0].meals[0].title, "Oatmeal with Berries");
        assert_eq!(plan.summary.total_days, 7);
    }

    #[test]
    fn normalizes_nested_envelope_shape() {
        let body = json!({"data": {"data": direct_body()}});
        let plan = normalize_response(body).expect("nested shape");
        assert_eq!(plan.meal_plan[0].meals[1].meal_type, MealType::Dinner);
        assert!((plan.summary.avg_daily_calories - 2100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unknown_shape() {
        let body = json!({"plan": [], "something_else": true});
        let err = normalize_response(body).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponseShape));
    }

    #[test]
    fn rejects_single_envelope_without_inner_data() {
        let body = json!({"data": direct_body()});
        let err = normalize_response(body).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponseShape));
    }

    #[test]
    fn retryable_statuses() {
        assert!(HttpMealPlanClient::is_retryable(
            StatusCode::TOO_MANY_REQUESTS
        ));
        assert!(HttpMealPlanClient::is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!HttpMealPlanClient::is_retryable(StatusCode::BAD_REQUEST));
        assert!(!HttpMealPlanClient::is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn request_payload_serializes_with_expected_field_names() {
        let req = MealPlanRequest {
            user_profile: UserProfilePayload {
                daily_calorie_target: 2605,
                daily_nutrients: DailyNutrients {
                    fats: 87,
                    carbs: 261,
                    protein: 195,
                },
                meal_frequency: MealFrequency {
                    breakfast: 1,
                    lunch: 1,
                    dinner: 1,
                    snack: 2,
                    dessert: 1,
                },
                dietary_preferences: DietaryPreferences {
                    diet_type: "omnivore".into(),
                    avoid_foods: vec![],
                    preferred_cuisines: vec!["italian".into()],
                },
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["user_profile"]["daily_calorie_target"], 2605);
        assert_eq!(value["user_profile"]["daily_nutrients"]["protein"], 195);
        assert_eq!(value["user_profile"]["meal_frequency"]["snack"], 2);
        assert_eq!(
            value["user_profile"]["dietary_preferences"]["diet_type"],
            "omnivore"
        );
    }
}
