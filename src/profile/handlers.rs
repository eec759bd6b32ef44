use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::services::AuthUser,
    planner::{input::RawPlannerForm, repo},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(put_profile))
}

/// Raw planner inputs as last saved.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<RawPlannerForm>, (StatusCode, String)> {
    let profile = repo::get_profile(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "get_profile failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .ok_or((StatusCode::NOT_FOUND, "Profile not set".to_string()))?;

    Ok(Json(profile))
}

/// Whole-record replacement of the raw inputs; runs no calculation.
#[instrument(skip(state, payload))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RawPlannerForm>,
) -> Result<Json<RawPlannerForm>, (StatusCode, String)> {
    repo::upsert_profile(&state.db, user_id, &payload)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "put_profile failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    info!(%user_id, "profile replaced");
    Ok(Json(payload))
}
