use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{repo_types::User, services::AuthUser},
    planner::{dto::PlanView, handlers::plan_view, wizard::SessionContext},
    state::AppState,
};

use super::dto::{AddClientRequest, ClientSummary};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/coach/clients", post(add_client))
        .route("/coach/clients", get(list_clients))
        .route("/coach/clients/:id", delete(remove_client))
        .route("/coach/clients/:id/plan", get(client_plan))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "coach query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn add_client(
    State(state): State<AppState>,
    AuthUser(coach_id): AuthUser,
    Json(mut payload): Json<AddClientRequest>,
) -> Result<(StatusCode, Json<ClientSummary>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    let client = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "No account with that email".to_string(),
        ))?;

    if client.id == coach_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "Cannot add yourself as a client".into(),
        ));
    }

    let created = repo::link_client(&state.db, coach_id, client.id)
        .await
        .map_err(internal)?;
    if !created {
        return Err((StatusCode::CONFLICT, "Client already linked".into()));
    }

    info!(%coach_id, client_id = %client.id, "client linked");
    let clients = repo::list_clients(&state.db, coach_id)
        .await
        .map_err(internal)?;
    let summary = clients
        .into_iter()
        .find(|c| c.id == client.id)
        .map(|c| ClientSummary {
            id: c.id,
            email: c.email,
            display_name: c.display_name,
            linked_at: c.linked_at,
        })
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Linked client missing from list".to_string(),
        ))?;

    Ok((StatusCode::CREATED, Json(summary)))
}

#[instrument(skip(state))]
pub async fn list_clients(
    State(state): State<AppState>,
    AuthUser(coach_id): AuthUser,
) -> Result<Json<Vec<ClientSummary>>, (StatusCode, String)> {
    let clients = repo::list_clients(&state.db, coach_id)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|c| ClientSummary {
            id: c.id,
            email: c.email,
            display_name: c.display_name,
            linked_at: c.linked_at,
        })
        .collect();
    Ok(Json(clients))
}

#[instrument(skip(state))]
pub async fn remove_client(
    State(state): State<AppState>,
    AuthUser(coach_id): AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = repo::unlink_client(&state.db, coach_id, client_id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err((StatusCode::NOT_FOUND, "Client not linked".into()));
    }
    info!(%coach_id, %client_id, "client unlinked");
    Ok(StatusCode::NO_CONTENT)
}

/// Read a client's plan on their behalf. The authorization check is the
/// join-table row match.
#[instrument(skip(state))]
pub async fn client_plan(
    State(state): State<AppState>,
    AuthUser(coach_id): AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<Json<PlanView>, (StatusCode, String)> {
    let authorized = repo::is_coach_of(&state.db, coach_id, client_id)
        .await
        .map_err(internal)?;
    if !authorized {
        warn!(%coach_id, %client_id, "coach access denied");
        return Err((StatusCode::FORBIDDEN, "Not your client".into()));
    }

    let ctx = SessionContext {
        user_id: coach_id,
        acting_for: Some(client_id),
        onboarding_complete: true,
    };
    plan_view(&state, &ctx).await.map(Json)
}
