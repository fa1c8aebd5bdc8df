//! Notification endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use reelhouse_common::AppResult;
use reelhouse_db::entities::notification;

use crate::{
    extractors::MemberUser,
    middleware::AppState,
    response::{Count, Success, success},
};

/// Create notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/count", get(unseen_count))
        .route("/notifications/read", put(mark_all_read))
}

/// Unseen notifications, newest first. Stale ones are purged first.
async fn list_notifications(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<notification::Model>>> {
    Ok(Json(state.notification_service.list_unseen(user.id).await?))
}

async fn unseen_count(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Count>> {
    let count = state.notification_service.count_unseen(user.id).await?;
    Ok(Json(Count { count }))
}

async fn mark_all_read(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> AppResult<Json<Success>> {
    state.notification_service.mark_all_seen(user.id).await?;
    Ok(success())
}
