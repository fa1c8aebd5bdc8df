//! Back-office endpoints. Every route requires a staff session.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use reelhouse_common::{AppError, AppResult};
use reelhouse_core::{EventForm, FlaggedReviewInput, MovieForm};
use reelhouse_db::{
    entities::user,
    repositories::{
        AdminCommentListing, AdminEventListing, AdminPostListing, AdminStats, AuditLogListing,
        ModerationItem,
    },
};
use serde::Deserialize;

use crate::{
    extractors::StaffUser,
    middleware::AppState,
    response::{Success, success},
};

/// Create admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/posts", get(list_posts))
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/comments", get(post_comments))
        .route("/comments/{id}", delete(delete_comment))
        .route(
            "/events",
            get(list_events).post(create_event).put(update_event),
        )
        .route("/events/cancel", post(cancel_event))
        .route("/movies", post(create_movie).put(update_movie))
        .route("/movies/{id}", delete(delete_movie))
        .route("/moderation", get(moderation_queue).post(review_flagged))
        .route("/audit-logs", get(audit_logs))
}

async fn stats(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<AdminStats>> {
    Ok(Json(state.admin_service.stats().await?))
}

// === Users ===

async fn list_users(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<user::Model>>> {
    Ok(Json(state.admin_service.users().await?))
}

async fn get_user(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<user::Model>> {
    Ok(Json(state.admin_service.user(user_id).await?))
}

/// Delete a member and everything they own.
async fn delete_user(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.admin_service.delete_user(admin.id, user_id).await?;
    Ok(success())
}

// === Posts & comments ===

async fn list_posts(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminPostListing>>> {
    Ok(Json(state.admin_service.posts().await?))
}

async fn delete_post(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.admin_service.delete_post(admin.id, post_id).await?;
    Ok(success())
}

async fn post_comments(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<Vec<AdminCommentListing>>> {
    Ok(Json(state.admin_service.post_comments(post_id).await?))
}

async fn delete_comment(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.admin_service.delete_comment(admin.id, comment_id).await?;
    Ok(success())
}

// === Events ===

async fn list_events(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminEventListing>>> {
    Ok(Json(state.event_service.admin_list().await?))
}

/// Schedule an event hosted by the platform rather than a member.
async fn create_event(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(form): Json<EventForm>,
) -> AppResult<Json<Success>> {
    state.event_service.admin_create(&admin, form).await?;
    Ok(success())
}

async fn update_event(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(form): Json<EventForm>,
) -> AppResult<Json<Success>> {
    state.event_service.admin_update(&admin, form).await?;
    Ok(success())
}

#[derive(Debug, Deserialize)]
struct CancelEventInput {
    #[serde(default)]
    event_id: Option<i32>,
}

async fn cancel_event(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<CancelEventInput>,
) -> AppResult<Json<Success>> {
    let event_id = input
        .event_id
        .ok_or_else(|| AppError::BadRequest("Missing event id".to_string()))?;
    state.event_service.admin_cancel(&admin, event_id).await?;
    Ok(success())
}

// === Movies ===

async fn create_movie(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(form): Json<MovieForm>,
) -> AppResult<Json<Success>> {
    state.catalog_service.create(admin.id, form).await?;
    Ok(success())
}

/// Update a movie and replace its genre links.
async fn update_movie(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(form): Json<MovieForm>,
) -> AppResult<Json<Success>> {
    state.catalog_service.update(admin.id, form).await?;
    Ok(success())
}

async fn delete_movie(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.catalog_service.delete(admin.id, movie_id).await?;
    Ok(success())
}

// === Moderation ===

/// Flagged and reported posts and comments.
async fn moderation_queue(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ModerationItem>>> {
    Ok(Json(state.moderation_service.queue().await?))
}

async fn review_flagged(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<FlaggedReviewInput>,
) -> AppResult<Json<Success>> {
    state.moderation_service.review(&admin, input).await?;
    Ok(success())
}

/// The 50 most recent audit entries.
async fn audit_logs(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AuditLogListing>>> {
    Ok(Json(state.admin_service.audit_logs().await?))
}
