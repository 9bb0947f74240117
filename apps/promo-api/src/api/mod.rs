//! HTTP routes, nested under `/api` by `axum_helpers::create_router`

pub mod health;
pub mod promos;

use axum::Router;

use crate::state::AppState;

pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/events", promos::router(state))
        .merge(health::router(state.clone()))
}
