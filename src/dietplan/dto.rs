use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::{ActivityLevel, Gender, Goal};

/// Slot a meal occupies within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "meal_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealType {
    #[serde(alias = "breakfast")]
    Breakfast,
    #[serde(alias = "lunch")]
    Lunch,
    #[serde(alias = "dinner")]
    Dinner,
    #[serde(alias = "snack")]
    Snack,
    #[serde(alias = "dessert")]
    Dessert,
}

/// Lifecycle of a user's relationship to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "plan_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    New,
    Active,
    NotActive,
}

impl PlanStatus {
    /// State machine step for the toggle endpoint: an ACTIVE plan goes
    /// dormant, anything else becomes the active plan.
    pub fn toggled(self) -> PlanStatus {
        match self {
            PlanStatus::Active => PlanStatus::NotActive,
            PlanStatus::New | PlanStatus::NotActive => PlanStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuisineShare {
    pub name: String,
    pub percentage: i32,
}

/// Inline profile override, used when the caller opts out of the stored one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverride {
    pub weight: f64,
    pub height: f64,
    pub birthdate: Date,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub food_intolerances: Vec<String>,
    #[serde(default)]
    pub smoking: bool,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub halal: bool,
    #[serde(default)]
    pub kosher: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDietPlanRequest {
    pub name: String,
    pub description: Option<String>,
    pub goal: Goal,
    pub include_snacks: bool,
    pub duration_in_weeks: i32,
    pub meal_per_day: i32,
    pub cuisine: Vec<CuisineShare>,
    pub use_profile: bool,
    pub profile: Option<ProfileOverride>,
}

impl CreateDietPlanRequest {
    /// Hand validation of field ranges; cuisine-sum normalization is the
    /// caller's responsibility and is deliberately not enforced here.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if !(1..=52).contains(&self.duration_in_weeks) {
            return Err("durationInWeeks must be between 1 and 52".into());
        }
        if !(1..=6).contains(&self.meal_per_day) {
            return Err("mealPerDay must be between 1 and 6".into());
        }
        if self.cuisine.is_empty() {
            return Err("cuisine must not be empty".into());
        }
        for share in &self.cuisine {
            if share.name.trim().is_empty() {
                return Err("cuisine name must not be empty".into());
            }
            if !(0..=100).contains(&share.percentage) {
                return Err("cuisine percentage must be between 0 and 100".into());
            }
        }
        Ok(())
    }
}

/// Envelope used by mutation endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlanPagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPagination {
    #[serde(default = "default_page")]
    pub day_page: i64,
    #[serde(default = "default_page_size")]
    pub day_page_size: i64,
}

fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    20
}

/// Clamps 1-based page params into a sane LIMIT/OFFSET pair.
pub fn page_to_limit_offset(page: i64, page_size: i64) -> (i64, i64) {
    let page = page.max(1);
    let limit = page_size.clamp(1, 100);
    (limit, (page - 1) * limit)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDetail {
    pub meal_type: MealType,
    pub recipe_id: Uuid,
    pub recipe_title: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetail {
    pub day_order: i32,
    pub meals: Vec<MealDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub goal: Goal,
    pub duration_in_weeks: i32,
    pub meal_per_day: i32,
    pub include_snacks: bool,
    pub cuisine: serde_json::Value,
    pub total_calories: i32,
    pub total_protein: i32,
    pub total_carbs: i32,
    pub total_fats: i32,
    pub published: bool,
    pub day_count: i64,
    pub days: Vec<DayDetail>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlanListItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub name: String,
    pub goal: Goal,
    pub status: PlanStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub activated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlanListResponse {
    pub items: Vec<UserPlanListItem>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateDietPlanRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Cut for summer",
            "goal": "LOSE_WEIGHT",
            "includeSnacks": true,
            "durationInWeeks": 4,
            "mealPerDay": 3,
            "cuisine": [{"name": "italian", "percentage": 50}, {"name": "greek", "percentage": 50}],
            "useProfile": true
        }))
        .expect("valid request json")
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_duration() {
        let mut req = valid_request();
        req.duration_in_weeks = 53;
        assert!(req.validate().is_err());
        req.duration_in_weeks = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_meal_count() {
        let mut req = valid_request();
        req.meal_per_day = 7;
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_bad_cuisine_percentage() {
        let mut req = valid_request();
        req.cuisine[0].percentage = 101;
        assert!(req.validate().is_err());
    }

    #[test]
    fn does_not_enforce_percentage_sum() {
        let mut req = valid_request();
        req.cuisine[0].percentage = 10;
        req.cuisine[1].percentage = 10;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn pagination_clamps_to_sane_bounds() {
        assert_eq!(page_to_limit_offset(1, 20), (20, 0));
        assert_eq!(page_to_limit_offset(3, 10), (10, 20));
        assert_eq!(page_to_limit_offset(-5, 500), (100, 0));
    }

    #[test]
    fn meal_type_accepts_lowercase_wire_values() {
        let t: MealType = serde_json::from_str("\"breakfast\"").unwrap();
        assert_eq!(t, MealType::Breakfast);
        let t: MealType = serde_json::from_str("\"DESSERT\"").unwrap();
        assert_eq!(t, MealType::Dessert);
    }
}
