use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{repo_types::User, services::AuthUser},
    planner::{handlers::plan_view, repo as planner_repo, wizard::SessionContext},
    state::AppState,
};

use super::pdf::{render_plan_pdf, ReportData};

pub fn routes() -> Router<AppState> {
    Router::new().route("/report/plan", get(plan_report))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "report query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Current plan as a downloadable PDF.
#[instrument(skip(state))]
pub async fn plan_report(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let ctx = SessionContext::for_user(user_id);
    let view = plan_view(&state, &ctx).await?;
    let profile = planner_repo::get_profile(&state.db, user_id)
        .await
        .map_err(internal)?;

    let data = ReportData {
        display_name: user.display_name.as_deref(),
        email: &user.email,
        source: view.source,
        profile: profile.as_ref(),
        targets: &view.active,
        meals: &view.meals,
    };
    let bytes = render_plan_pdf(&data).map_err(|e| {
        error!(error = %e, %user_id, "pdf render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"nutriplan-report.pdf\"",
            ),
        ],
        bytes,
    ))
}
