//! Health check route.

use axum::{Json, Router, extract::State, routing::get};

use crate::api::models::HealthResponse;
use crate::api::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.reconciler.snapshot();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        watched: state.watchlist.len(),
        live: snapshot.live_count(),
        ticks: snapshot.tick(),
        last_tick_at: snapshot.completed_at(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::api::routes::test_support::TestApp;

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        app.state.watchlist.add("alice").await.unwrap();

        let (status, body) = app.request(Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["watched"], 1);
        assert_eq!(body["live"], 0);
        assert_eq!(body["ticks"], 0);
        assert!(body.get("last_tick_at").is_none());
    }
}
