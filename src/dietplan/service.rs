//! Plan generation: profile resolution, metabolic targets, the external
//! call, recipe matching and transactional persistence.

use std::collections::HashMap;

use time::{Date, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dietplan::assembler::build_meal_plan_request;
use crate::dietplan::client::GeneratedDay;
use crate::dietplan::dto::{CreateDietPlanRequest, MealType, ProfileOverride};
use crate::dietplan::repo::{self, DietPlan, NewDietPlan, UserDietPlan};
use crate::error::ApiError;
use crate::nutrition::{self, ActivityLevel, EnergyTargets, Gender};
use crate::profile::repo::Profile;
use crate::recipes;
use crate::state::AppState;

/// The subset of profile data the generator needs, whether it came from the
/// stored profile or an inline override.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub birthdate: Date,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub vegetarian: bool,
    pub vegan: bool,
}

impl From<Profile> for ResolvedProfile {
    fn from(p: Profile) -> Self {
        Self {
            weight_kg: p.weight_kg,
            height_cm: p.height_cm,
            birthdate: p.birthdate,
            gender: p.gender,
            activity_level: p.activity_level,
            vegetarian: p.vegetarian,
            vegan: p.vegan,
        }
    }
}

impl From<ProfileOverride> for ResolvedProfile {
    fn from(p: ProfileOverride) -> Self {
        Self {
            weight_kg: p.weight,
            height_cm: p.height,
            birthdate: p.birthdate,
            gender: p.gender,
            activity_level: p.activity_level,
            vegetarian: p.vegetarian,
            vegan: p.vegan,
        }
    }
}

/// A day whose meals have been matched to catalog recipes.
#[derive(Debug, Clone)]
pub struct ResolvedDay {
    pub meals: Vec<(MealType, Uuid)>,
}

/// Matches generated meals to recipe ids by lowercased title. Unmatched
/// titles are returned separately; the caller logs and drops them without
/// aborting the plan.
pub fn resolve_days(
    generated: &[GeneratedDay],
    recipes_by_title: &HashMap<String, Uuid>,
) -> (Vec<ResolvedDay>, Vec<String>) {
    let mut days = Vec::with_capacity(generated.len());
    let mut unmatched = Vec::new();
    for day in generated {
        let mut meals = Vec::with_capacity(day.meals.len());
        for meal in &day.meals {
            match recipes_by_title.get(&meal.title.to_lowercase()) {
                Some(&recipe_id) => meals.push((meal.meal_type, recipe_id)),
                None => unmatched.push(meal.title.clone()),
            }
        }
        days.push(ResolvedDay { meals });
    }
    (days, unmatched)
}

pub fn resolve_profile(
    stored: Option<Profile>,
    override_profile: Option<ProfileOverride>,
    use_profile: bool,
) -> Result<ResolvedProfile, ApiError> {
    if use_profile {
        stored
            .map(ResolvedProfile::from)
            .ok_or_else(|| ApiError::NotFound("Profile not found".into()))
    } else {
        override_profile
            .map(ResolvedProfile::from)
            .ok_or_else(|| ApiError::NotFound("Profile not found".into()))
    }
}

fn aggregate_totals(targets: &EnergyTargets, avg_daily_calories: f64, total_days: i32) -> [i32; 4] {
    let days = f64::from(total_days);
    [
        (avg_daily_calories * days).round() as i32,
        targets.macros.protein * total_days,
        targets.macros.carbs * total_days,
        targets.macros.fats * total_days,
    ]
}

/// Full generation pipeline. Everything after the external call happens in
/// one transaction, so a failed insert leaves no partial plan behind.
pub async fn generate_plan(
    state: &AppState,
    user_id: Uuid,
    req: CreateDietPlanRequest,
) -> Result<Uuid, ApiError> {
    let stored = if req.use_profile {
        Profile::find_by_user(&state.db, user_id).await?
    } else {
        None
    };
    let profile = resolve_profile(stored, req.profile.clone(), req.use_profile)?;

    let today = OffsetDateTime::now_utc().date();
    let age = nutrition::age_on(profile.birthdate, today);
    let targets = nutrition::energy_targets(
        profile.weight_kg,
        profile.height_cm,
        age,
        profile.gender,
        profile.activity_level,
        req.goal,
    );

    let payload =
        build_meal_plan_request(&targets, profile.vegetarian, profile.vegan, &req.cuisine);
    let response = state.meal_api.generate(&payload).await?;

    let titles: Vec<String> = response
        .meal_plan
        .iter()
        .flat_map(|d| d.meals.iter().map(|m| m.title.to_lowercase()))
        .collect();
    let recipes_by_title = recipes::repo::ids_by_lower_title(&state.db, &titles).await?;

    let (days, unmatched) = resolve_days(&response.meal_plan, &recipes_by_title);
    for title in &unmatched {
        warn!(%user_id, title, "no recipe matches generated meal, skipping");
    }

    let [total_calories, total_protein, total_carbs, total_fats] = aggregate_totals(
        &targets,
        response.summary.avg_daily_calories,
        response.summary.total_days,
    );

    let mut tx = state.db.begin().await?;

    let plan = DietPlan::insert(
        &mut tx,
        &NewDietPlan {
            name: &req.name,
            description: req.description.as_deref(),
            goal: req.goal,
            duration_weeks: req.duration_in_weeks,
            meals_per_day: req.meal_per_day,
            include_snacks: req.include_snacks,
            cuisines: serde_json::to_value(&req.cuisine).map_err(anyhow::Error::from)?,
            total_calories,
            total_protein,
            total_carbs,
            total_fats,
            created_by: user_id,
        },
    )
    .await?;

    UserDietPlan::insert(&mut tx, user_id, plan.id).await?;

    for (index, day) in days.iter().enumerate() {
        let day_id = repo::insert_day(&mut tx, plan.id, index as i32).await?;
        for &(meal_type, recipe_id) in &day.meals {
            repo::insert_meal(&mut tx, day_id, meal_type, recipe_id).await?;
        }
    }

    tx.commit().await?;

    info!(
        %user_id,
        plan_id = %plan.id,
        days = days.len(),
        skipped_meals = unmatched.len(),
        "diet plan generated"
    );
    Ok(plan.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dietplan::client::GeneratedMeal;
    use time::macros::date;

    fn day(titles: &[(&str, MealType)]) -> GeneratedDay {
        GeneratedDay {
            day: None,
            meals: titles
                .iter()
                .map(|(t, ty)| GeneratedMeal {
                    meal_type: *ty,
                    title: (*t).to_string(),
                })
                .collect(),
        }
    }

    fn catalog(titles: &[&str]) -> HashMap<String, Uuid> {
        titles
            .iter()
            .map(|t| (t.to_lowercase(), Uuid::new_v4()))
            .collect()
    }

    #[test]
    fn unmatched_title_drops_only_that_meal() {
        let generated = vec![day(&[
            ("Oatmeal with Berries", MealType::Breakfast),
            ("Mystery Casserole", MealType::Dinner),
        ])];
        let recipes = catalog(&["Oatmeal with Berries"]);

        let (days, unmatched) = resolve_days(&generated, &recipes);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].meals.len(), 1);
        assert_eq!(unmatched, vec!["Mystery Casserole".to_string()]);
    }

    #[test]
    fn title_match_is_case_insensitive() {
        let generated = vec![day(&[("GRILLED salmon", MealType::Dinner)])];
        let recipes = catalog(&["Grilled Salmon"]);

        let (days, unmatched) = resolve_days(&generated, &recipes);
        assert_eq!(days[0].meals.len(), 1);
        assert!(unmatched.is_empty());
    }

    #[test]
    fn day_order_follows_input_order() {
        let generated = vec![
            day(&[("A", MealType::Breakfast)]),
            day(&[("B", MealType::Lunch)]),
            day(&[("C", MealType::Dinner)]),
        ];
        let recipes = catalog(&["A", "B", "C"]);

        let (days, _) = resolve_days(&generated, &recipes);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].meals[0].0, MealType::Breakfast);
        assert_eq!(days[2].meals[0].0, MealType::Dinner);
    }

    #[test]
    fn profile_resolution_requires_some_source() {
        let err = resolve_profile(None, None, true).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = resolve_profile(None, None, false).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn override_profile_wins_when_not_using_stored() {
        let override_profile = ProfileOverride {
            weight: 70.0,
            height: 180.0,
            birthdate: date!(1994 - 03 - 02),
            gender: Gender::Male,
            activity_level: ActivityLevel::Sedentary,
            medications: vec![],
            food_intolerances: vec![],
            smoking: false,
            vegetarian: true,
            vegan: false,
            halal: false,
            kosher: false,
        };
        let resolved = resolve_profile(None, Some(override_profile), false).unwrap();
        assert!(resolved.vegetarian);
        assert_eq!(resolved.gender, Gender::Male);
    }

    #[test]
    fn aggregate_totals_scale_daily_targets_by_days() {
        let targets = nutrition::energy_targets(
            70.0,
            180.0,
            30,
            Gender::Male,
            ActivityLevel::ModeratelyActive,
            crate::nutrition::Goal::MaintainWeight,
        );
        let [cal, protein, carbs, fats] = aggregate_totals(&targets, 2100.0, 7);
        assert_eq!(cal, 14700);
        assert_eq!(protein, targets.macros.protein * 7);
        assert_eq!(carbs, targets.macros.carbs * 7);
        assert_eq!(fats, targets.macros.fats * 7);
    }

    #[test]
    fn status_toggle_transitions() {
        use crate::dietplan::dto::PlanStatus;
        assert_eq!(PlanStatus::New.toggled(), PlanStatus::Active);
        assert_eq!(PlanStatus::NotActive.toggled(), PlanStatus::Active);
        assert_eq!(PlanStatus::Active.toggled(), PlanStatus::NotActive);
    }
}
