//! Watchlist, history and dashboard endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use reelhouse_common::AppResult;
use reelhouse_core::{Dashboard, WatchlistInput};
use reelhouse_db::repositories::{HistoryEntry, WatchlistEntry};

use crate::{
    extractors::MemberUser,
    middleware::AppState,
    response::{Success, success},
};

/// Create watchlist router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(list_watchlist).post(set_status))
        .route("/user/history", get(history))
        .route("/user/dashboard", get(dashboard))
}

async fn list_watchlist(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    Ok(Json(state.watchlist_service.list(user.id).await?))
}

/// Add a movie or move it to another status. History is written on change.
async fn set_status(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(input): Json<WatchlistInput>,
) -> AppResult<Json<Success>> {
    state.watchlist_service.set_status(user.id, input).await?;
    Ok(success())
}

async fn history(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(state.watchlist_service.history(user.id).await?))
}

async fn dashboard(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Dashboard>> {
    Ok(Json(state.dashboard_service.load(user.id).await?))
}
