//! Live roster and manual tick routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::api::models::{LiveChannel, LiveResponse};
use crate::api::server::AppState;
use crate::reconciler::TickReport;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/live", get(live_channels))
        .route("/api/tick", post(run_tick))
}

/// Channels live as of the last completed tick.
async fn live_channels(State(state): State<AppState>) -> Json<LiveResponse> {
    let snapshot = state.reconciler.snapshot();
    let channels = snapshot
        .live_entries()
        .map(|(id, entry)| LiveChannel {
            id: id.to_string(),
            display_name: entry.status.display_name.clone(),
            title: entry.status.title.clone(),
            category: entry.status.category.clone(),
            viewer_count: entry.status.viewer_count,
            live_since: entry.live_since,
            message_id: entry.handle.to_string(),
        })
        .collect();

    Json(LiveResponse {
        tick: snapshot.tick(),
        channels,
    })
}

/// Run a tick now. Reports `skipped` if the scheduled one is still running.
async fn run_tick(State(state): State<AppState>) -> Json<TickReport> {
    Json(state.reconciler.tick().await)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::api::routes::test_support::TestApp;

    #[tokio::test]
    async fn test_tick_then_live() {
        let app = TestApp::new();
        app.state.watchlist.add("alice").await.unwrap();
        app.state.watchlist.add("bob").await.unwrap();
        app.provider.set_live("bob", "Speedrun");

        let (status, body) = app.request(Method::GET, "/api/live", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channels"].as_array().unwrap().len(), 0);

        let (status, report) = app.request(Method::POST, "/api/tick", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["tick"], 1);
        assert_eq!(report["skipped"], false);
        assert_eq!(report["entities"].as_array().unwrap().len(), 2);

        let (_, body) = app.request(Method::GET, "/api/live", None).await;
        let channels = body["channels"].as_array().unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0]["id"], "bob");
        assert_eq!(channels[0]["title"], "Speedrun");
        assert_eq!(channels[0]["message_id"], "msg-0");
    }
}
