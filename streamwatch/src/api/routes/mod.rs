//! API route modules.

pub mod health;
pub mod logging;
pub mod reconciler;
pub mod watchlist;

use axum::Router;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/watchlist", watchlist::router())
        .nest("/api/logging", logging::router())
        .merge(reconciler::router())
        .nest("/health", health::router())
        .with_state(state)
}
