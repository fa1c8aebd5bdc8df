//! Private messages between friends.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use reelhouse_common::AppResult;
use reelhouse_core::SendMessageInput;
use reelhouse_db::repositories::ThreadMessage;

use crate::{
    extractors::MemberUser,
    middleware::AppState,
    response::{Success, success},
};

/// Create messages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/{friend_id}", get(thread))
        .route("/messages/read/{friend_id}", put(mark_read))
}

async fn send_message(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<Json<Success>> {
    state.messaging_service.send(&user, input).await?;
    Ok(success())
}

/// The conversation with one friend, oldest first. Opening it marks the
/// friend's messages read.
async fn thread(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(friend_id): Path<i32>,
) -> AppResult<Json<Vec<ThreadMessage>>> {
    Ok(Json(state.messaging_service.thread(user.id, friend_id).await?))
}

async fn mark_read(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(friend_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.messaging_service.mark_read(user.id, friend_id).await?;
    Ok(success())
}
