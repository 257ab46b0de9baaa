use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::services::AuthUser,
    error::ApiError,
    profile::{
        dto::{ProfileResponse, ProfileUpsertRequest},
        repo::{Profile, ProfileInput},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(upsert_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = Profile::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state, payload))]
pub async fn upsert_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProfileUpsertRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    payload.validate().map_err(ApiError::InvalidInput)?;

    let profile = Profile::upsert(
        &state.db,
        user_id,
        &ProfileInput {
            weight_kg: payload.weight,
            height_cm: payload.height,
            birthdate: payload.birthdate,
            gender: payload.gender,
            activity_level: payload.activity_level,
            medications: &payload.medications,
            food_intolerances: &payload.food_intolerances,
            smoking: payload.smoking,
            vegetarian: payload.vegetarian,
            vegan: payload.vegan,
            halal: payload.halal,
            kosher: payload.kosher,
        },
    )
    .await?;

    info!(%user_id, "profile upserted");
    Ok(Json(profile.into()))
}
