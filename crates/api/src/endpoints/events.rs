//! Watch-party endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use reelhouse_common::AppResult;
use reelhouse_core::EventForm;
use reelhouse_db::repositories::EventListing;
use tracing::info;

use crate::{
    extractors::{CurrentUser, MemberUser, StaffUser},
    middleware::AppState,
    response::{CountResponse, Success, success},
};

/// Create events router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{id}/join", post(join_event))
        .route("/events/conclude", post(conclude_events))
        .route("/user/events", post(host_event))
}

/// Upcoming and past events, cancelled ones excluded.
async fn list_events(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EventListing>>> {
    Ok(Json(state.event_service.list().await?))
}

/// Host a watch party. Rejected when it overlaps another hosted event.
async fn host_event(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(form): Json<EventForm>,
) -> AppResult<Json<Success>> {
    state.event_service.host_event(&user, form).await?;
    Ok(success())
}

async fn join_event(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.event_service.join_event(&user, event_id).await?;
    Ok(success())
}

/// Run the expired-event sweep now instead of waiting for the scheduler.
async fn conclude_events(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<CountResponse>> {
    let count = state.event_service.conclude_expired().await?;
    info!(admin_id = admin.id, count, "Concluded events on demand");
    Ok(Json(CountResponse {
        success: true,
        count: count as u64,
    }))
}
