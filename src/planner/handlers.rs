use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{repo_types::User, services::AuthUser},
    state::AppState,
};

use super::dto::{
    CalculateRequest, CalculateResponse, PlanView, PutMealsRequest, PutMealsResponse,
    WizardRequest, WizardResponse,
};
use super::input::{normalize, resolve_targets};
use super::meals::{distribute, validate_slots, DailyTotals};
use super::wizard::{SessionContext, Transition, Wizard, WizardStep};
use super::{compute_plans, estimate_from_metrics, repo};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/planner/plan", get(get_plan))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/planner/calculate", post(calculate))
        .route("/planner/plan", put(save_plan))
        .route("/planner/meals", put(put_meals))
        .route("/planner/wizard", post(wizard_step))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "planner persistence failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Pure calculation; persists nothing.
#[instrument(skip(payload))]
pub async fn calculate(
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, (StatusCode, String)> {
    let input = normalize(&payload.form)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let plans =
        compute_plans(&input).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let meals = payload.meal_slots.as_deref().map(|slots| {
        let active = plans.custom_plan.as_ref().unwrap_or(&plans.default_plan);
        distribute(DailyTotals::from(active), slots)
    });

    info!(%user_id, target = plans.default_plan.target_calories, "plan calculated");
    Ok(Json(CalculateResponse { plans, meals }))
}

/// Calculate and persist: profile first, then plan, as two independent writes.
#[instrument(skip(state, payload))]
pub async fn save_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, (StatusCode, String)> {
    let input = normalize(&payload.form)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let plans =
        compute_plans(&input).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    repo::upsert_profile(&state.db, user_id, &payload.form)
        .await
        .map_err(internal)?;
    repo::upsert_plan(&state.db, user_id, &plans)
        .await
        .map_err(internal)?;

    info!(%user_id, target = plans.default_plan.target_calories, "plan saved");
    Ok(Json(CalculateResponse { plans, meals: None }))
}

/// Current plan with its resolved active target source.
#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PlanView>, (StatusCode, String)> {
    let ctx = SessionContext::for_user(user_id);
    plan_view(&state, &ctx).await.map(Json)
}

/// Shared with the coach module, which supplies an acting-for context.
pub(crate) async fn plan_view(
    state: &AppState,
    ctx: &SessionContext,
) -> Result<PlanView, (StatusCode, String)> {
    let subject = ctx.subject();

    let stored = repo::get_plan(&state.db, subject).await.map_err(internal)?;
    let profile = repo::get_profile(&state.db, subject)
        .await
        .map_err(internal)?;

    let (manual, smart, meal_slots) = match &stored {
        Some(plan) => (
            plan.custom_plan.clone(),
            Some(plan.default_plan.clone()),
            plan.meal_slots.clone(),
        ),
        None => (None, None, Vec::new()),
    };

    // A bare profile estimate is the weakest source: maintenance at TDEE.
    let estimate = profile.as_ref().and_then(|form| {
        let input = normalize(form).ok()?;
        estimate_from_metrics(&input.metrics, input.activity, input.goal).ok()
    });

    let Some((source, active)) = resolve_targets(manual, smart, estimate) else {
        warn!(%subject, "no plan or profile to resolve targets from");
        return Err((StatusCode::NOT_FOUND, "Plan not set".into()));
    };

    let meals = distribute(DailyTotals::from(&active), &meal_slots);
    let (default_plan, custom_plan) = match stored {
        Some(plan) => (Some(plan.default_plan), plan.custom_plan),
        None => (None, None),
    };

    Ok(PlanView {
        source,
        active,
        default_plan,
        custom_plan,
        meal_slots,
        meals,
    })
}

/// Replace the meal distribution. An off-100 sum is flagged in the response
/// but still saved.
#[instrument(skip(state, payload))]
pub async fn put_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PutMealsRequest>,
) -> Result<Json<PutMealsResponse>, (StatusCode, String)> {
    validate_slots(&payload.meal_slots)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let stored = repo::get_plan(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Plan not set".to_string()))?;

    let active = stored
        .custom_plan
        .as_ref()
        .unwrap_or(&stored.default_plan);
    let meals = distribute(DailyTotals::from(active), &payload.meal_slots);
    if !meals.sums_to_100 {
        warn!(%user_id, pct_sum = meals.pct_sum, "meal percentages do not sum to 100");
    }

    let updated = repo::update_meal_slots(&state.db, user_id, &payload.meal_slots)
        .await
        .map_err(internal)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Plan not set".into()));
    }

    Ok(Json(PutMealsResponse { meals }))
}

/// One wizard step submission. Navigation is driven by the returned
/// transition; completing the wizard persists and marks onboarding done.
#[instrument(skip(state, payload))]
pub async fn wizard_step(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<WizardRequest>,
) -> Result<Json<WizardResponse>, (StatusCode, String)> {
    let step = WizardStep::from_index(payload.step).ok_or((
        StatusCode::BAD_REQUEST,
        format!("unknown wizard step: {}", payload.step),
    ))?;

    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    let ctx = SessionContext {
        user_id,
        acting_for: None,
        onboarding_complete: user.onboarding_complete,
    };

    let mut wizard = Wizard::default();
    let transition = wizard.advance(&ctx, step, &payload.form);

    let saved = if let Transition::Completed { plans } = &transition {
        repo::upsert_profile(&state.db, user_id, wizard.form())
            .await
            .map_err(internal)?;
        repo::upsert_plan(&state.db, user_id, plans)
            .await
            .map_err(internal)?;
        User::mark_onboarded(&state.db, user_id)
            .await
            .map_err(internal)?;
        info!(%user_id, "onboarding wizard completed");
        true
    } else {
        false
    };

    Ok(Json(WizardResponse { transition, saved }))
}
