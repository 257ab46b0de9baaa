//! Builds the external request payload from computed targets and dietary
//! preferences.

use crate::dietplan::client::{
    DailyNutrients, DietaryPreferences, MealFrequency, MealPlanRequest, UserProfilePayload,
};
use crate::dietplan::dto::CuisineShare;
use crate::nutrition::EnergyTargets;

/// Fixed per-day slot template sent to the generator. Intentionally not
/// derived from the caller's `mealPerDay`/`includeSnacks` choices, which only
/// shape the stored plan metadata.
fn slot_template() -> MealFrequency {
    MealFrequency {
        breakfast: 1,
        lunch: 1,
        dinner: 1,
        snack: 2,
        dessert: 1,
    }
}

/// Diet type with vegan taking precedence over vegetarian.
pub fn diet_type(vegetarian: bool, vegan: bool) -> &'static str {
    if vegan {
        "vegan"
    } else if vegetarian {
        "vegetarian"
    } else {
        "omnivore"
    }
}

/// Assembles the generator payload. Cuisine percentages are dropped at this
/// boundary; only the names travel.
pub fn build_meal_plan_request(
    targets: &EnergyTargets,
    vegetarian: bool,
    vegan: bool,
    cuisines: &[CuisineShare],
) -> MealPlanRequest {
    MealPlanRequest {
        user_profile: UserProfilePayload {
            daily_calorie_target: targets.target_calories,
            daily_nutrients: DailyNutrients {
                fats: targets.macros.fats,
                carbs: targets.macros.carbs,
                protein: targets.macros.protein,
            },
            meal_frequency: slot_template(),
            dietary_preferences: DietaryPreferences {
                diet_type: diet_type(vegetarian, vegan).to_string(),
                avoid_foods: Vec::new(),
                preferred_cuisines: cuisines.iter().map(|c| c.name.clone()).collect(),
            },
        },
    }
}
