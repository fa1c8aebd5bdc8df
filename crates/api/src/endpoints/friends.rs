//! Friend search, requests and profiles.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use reelhouse_common::AppResult;
use reelhouse_core::{FriendProfile, FriendRequestInput, RespondInput};
use reelhouse_db::repositories::{PendingRequest, UserSummary};
use serde::Deserialize;

use crate::{
    extractors::MemberUser,
    middleware::AppState,
    response::{Success, success},
};

/// Create friends router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/search", get(search_users))
        .route("/users/{id}/profile", get(profile))
        .route("/friends", get(list_friends))
        .route("/friends/request", post(send_request))
        .route("/friends/requests", get(pending_requests))
        .route("/friends/respond", put(respond))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Members the caller could befriend, matched by name.
async fn search_users(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.friend_service.search(user.id, &query.q).await?))
}

async fn send_request(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(input): Json<FriendRequestInput>,
) -> AppResult<Json<Success>> {
    state.friend_service.send_request(&user, input).await?;
    Ok(success())
}

/// Pending requests addressed to the caller.
async fn pending_requests(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PendingRequest>>> {
    Ok(Json(state.friend_service.pending(user.id).await?))
}

async fn respond(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(input): Json<RespondInput>,
) -> AppResult<Json<Success>> {
    state.friend_service.respond(&user, input).await?;
    Ok(success())
}

async fn list_friends(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.friend_service.list(user.id).await?))
}

async fn profile(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(friend_id): Path<i32>,
) -> AppResult<Json<FriendProfile>> {
    Ok(Json(state.friend_service.profile(user.id, friend_id).await?))
}
