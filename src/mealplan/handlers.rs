use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::{auth::services::AuthUser, planner, state::AppState};

use super::dto::{ChatRequest, ChatResponse, MealPlanResponse};
use super::{repo, services};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mealplan/generate", post(generate))
        .route("/mealplan", get(get_current))
        .route("/mealplan/chat", post(chat))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "meal plan persistence failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Generate a plan from the stored targets and replace the current one.
#[instrument(skip(state))]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MealPlanResponse>, (StatusCode, String)> {
    let stored = planner::repo::get_plan(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Plan not set".to_string()))?;

    let active = stored
        .custom_plan
        .as_ref()
        .unwrap_or(&stored.default_plan);

    let (plan, raw) = services::request_plan(&state, active, &stored.meal_slots)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "meal plan generation failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    repo::upsert_meal_plan(&state.db, user_id, &plan, &raw)
        .await
        .map_err(internal)?;

    info!(%user_id, days = plan.days.len(), "meal plan generated");
    Ok(Json(MealPlanResponse {
        plan,
        updated_at: OffsetDateTime::now_utc(),
    }))
}

#[instrument(skip(state))]
pub async fn get_current(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MealPlanResponse>, (StatusCode, String)> {
    let stored = repo::get_meal_plan(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "No meal plan generated".to_string()))?;

    Ok(Json(MealPlanResponse {
        plan: stored.plan,
        updated_at: stored.updated_at,
    }))
}

/// Single-turn chat grounded in the current targets. Nothing is persisted.
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if payload.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".into()));
    }

    let stored = planner::repo::get_plan(&state.db, user_id)
        .await
        .map_err(internal)?;
    let active = stored
        .as_ref()
        .map(|p| p.custom_plan.as_ref().unwrap_or(&p.default_plan));

    let system = services::chat_prompt(active);
    let reply = state
        .ai
        .complete(&system, &payload.message)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "chat completion failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(ChatResponse { reply }))
}
