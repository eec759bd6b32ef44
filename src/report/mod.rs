use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod pdf;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
