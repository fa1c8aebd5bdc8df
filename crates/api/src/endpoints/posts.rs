//! Post, comment, like and report endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use reelhouse_common::AppResult;
use reelhouse_core::{ContentInput, CreatePostInput};
use reelhouse_db::repositories::{CommentListing, PostListing};

use crate::{
    extractors::{CurrentUser, MemberUser},
    middleware::AppState,
    response::{Success, success},
};

/// Create posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}/like", post(like_post))
        .route("/posts/{id}/comments", get(list_comments).post(add_comment))
        .route("/posts/{id}/report", post(report_post))
        .route("/comments/{id}/report", post(report_comment))
}

/// Community feed: active posts with author, movie and counters.
async fn list_posts(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PostListing>>> {
    Ok(Json(state.post_service.list().await?))
}

async fn create_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<Json<Success>> {
    state.post_service.create_post(&user, input).await?;
    Ok(success())
}

async fn like_post(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.post_service.like(&user, post_id).await?;
    Ok(success())
}

async fn list_comments(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<Vec<CommentListing>>> {
    Ok(Json(state.post_service.comments(post_id).await?))
}

async fn add_comment(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    Json(input): Json<ContentInput>,
) -> AppResult<Json<Success>> {
    state
        .post_service
        .add_comment(&user, post_id, &input.content)
        .await?;
    Ok(success())
}

/// Send a post to the moderation queue.
async fn report_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.post_service.report_post(&user, post_id).await?;
    Ok(success())
}

async fn report_comment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.post_service.report_comment(&user, comment_id).await?;
    Ok(success())
}
