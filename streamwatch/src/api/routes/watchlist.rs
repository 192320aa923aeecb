//! Watchlist routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{AddChannelResponse, RemoveChannelResponse, WatchlistResponse};
use crate::api::server::AppState;
use crate::watchlist::normalize_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_channels))
        .route("/{id}", put(add_channel).delete(remove_channel))
}

async fn list_channels(State(state): State<AppState>) -> Json<WatchlistResponse> {
    Json(WatchlistResponse {
        ids: state.watchlist.list().into_iter().collect(),
    })
}

/// 201 when the channel was added, 200 when it was already watched.
async fn add_channel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<AddChannelResponse>)> {
    let id = normalize_id(&id)?;
    let added = state.watchlist.add(&id).await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(AddChannelResponse { id, added })))
}

async fn remove_channel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RemoveChannelResponse>> {
    let id = normalize_id(&id)?;
    if !state.watchlist.remove(&id).await? {
        return Err(ApiError::not_found(format!("channel '{}' is not watched", id)));
    }

    Ok(Json(RemoveChannelResponse { id, removed: true }))
}
