use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    dietplan::{
        dto::{
            page_to_limit_offset, CreateDietPlanRequest, DayDetail, DayPagination, MealDetail,
            PlanDetailResponse, StatusResponse, UserPlanListItem, UserPlanListResponse,
            UserPlanPagination,
        },
        repo::{self, DietPlan, UserDietPlan},
        service,
    },
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/dietplan/user", get(list_user_plans))
        .route("/dietplan/:id", get(get_plan_detail))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/dietplan", post(create_plan))
        .route("/dietplan/user/:id", delete(delete_user_plan))
        .route("/dietplan/user/:id/toggle-active", patch(toggle_active))
}

#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateDietPlanRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    payload.validate().map_err(ApiError::InvalidInput)?;
    service::generate_plan(&state, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::ok("Diet plan created")),
    ))
}

#[instrument(skip(state))]
pub async fn get_plan_detail(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(p): Query<DayPagination>,
) -> Result<Json<PlanDetailResponse>, ApiError> {
    let (limit, offset) = page_to_limit_offset(p.day_page, p.day_page_size);
    let cache_key = format!("plan:{id}:{limit}:{offset}");
    if let Some(cached) = state.cache.get::<PlanDetailResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let plan = DietPlan::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Diet plan not found".into()))?;

    let day_count = repo::count_days(&state.db, id).await?;
    let days = repo::list_days(&state.db, id, limit, offset).await?;
    let day_ids: Vec<Uuid> = days.iter().map(|d| d.id).collect();
    let meals = repo::list_meals_for_days(&state.db, &day_ids).await?;

    let days = days
        .into_iter()
        .map(|day| DayDetail {
            day_order: day.day_order,
            meals: meals
                .iter()
                .filter(|m| m.day_id == day.id)
                .map(|m| MealDetail {
                    meal_type: m.meal_type,
                    recipe_id: m.recipe_id,
                    recipe_title: m.recipe_title.clone(),
                })
                .collect(),
        })
        .collect();

    let response = PlanDetailResponse {
        id: plan.id,
        name: plan.name,
        description: plan.description,
        goal: plan.goal,
        duration_in_weeks: plan.duration_weeks,
        meal_per_day: plan.meals_per_day,
        include_snacks: plan.include_snacks,
        cuisine: plan.cuisines,
        total_calories: plan.total_calories,
        total_protein: plan.total_protein,
        total_carbs: plan.total_carbs,
        total_fats: plan.total_fats,
        published: plan.published,
        day_count,
        days,
    };

    let ttl = Duration::from_secs(state.config.plan_cache_ttl_secs);
    state.cache.set(&cache_key, &response, ttl).await;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn list_user_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<UserPlanPagination>,
) -> Result<Json<UserPlanListResponse>, ApiError> {
    let (limit, offset) = page_to_limit_offset(p.page, p.page_size);
    let rows = UserDietPlan::list_for_user(&state.db, user_id, limit, offset).await?;
    let total = UserDietPlan::count_for_user(&state.db, user_id).await?;

    let items = rows
        .into_iter()
        .map(|r| UserPlanListItem {
            id: r.id,
            plan_id: r.plan_id,
            name: r.name,
            goal: r.goal,
            status: r.status,
            activated_at: r.activated_at,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(UserPlanListResponse {
        items,
        page: p.page.max(1),
        page_size: limit,
        total,
    }))
}

#[instrument(skip(state))]
pub async fn delete_user_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user_plan = UserDietPlan::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Diet plan not found".into()))?;
    if user_plan.user_id != user_id {
        return Err(ApiError::Forbidden("Not your diet plan".into()));
    }

    // Progress logs go with it via ON DELETE CASCADE.
    UserDietPlan::delete(&state.db, id).await?;
    info!(%user_id, user_plan_id = %id, "user diet plan deleted");
    Ok(Json(StatusResponse::ok("Diet plan removed")))
}

#[instrument(skip(state))]
pub async fn toggle_active(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user_plan = UserDietPlan::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Diet plan not found".into()))?;
    if user_plan.user_id != user_id {
        return Err(ApiError::Forbidden("Not your diet plan".into()));
    }

    let next = user_plan.toggle_active(&state.db).await?;
    info!(%user_id, user_plan_id = %id, status = ?next, "plan status toggled");
    Ok(Json(StatusResponse {
        success: true,
        message: "Plan status updated".into(),
        data: Some(json!({ "status": next })),
    }))
}
