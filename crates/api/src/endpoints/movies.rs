//! Catalog, per-movie forum and review endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use reelhouse_common::AppResult;
use reelhouse_core::{ContentInput, ReviewInput};
use reelhouse_db::{
    entities::genre,
    repositories::{ForumPost, MovieListing, RecommendedMovie, ReviewListing, TrendingMovie},
};

use crate::{
    extractors::{CurrentUser, MemberUser},
    middleware::AppState,
    response::{Success, success},
};

/// Create movies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/genres", get(list_genres))
        .route("/movies/{id}/forum", get(forum_posts).post(post_to_forum))
        .route("/movies/{id}/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", delete(delete_review))
        .route("/user/recommendations", get(recommendations))
        .route("/user/trending", get(trending))
}

/// Every movie, newest first.
async fn list_movies(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MovieListing>>> {
    Ok(Json(state.catalog_service.list().await?))
}

async fn list_genres(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<genre::Model>>> {
    Ok(Json(state.catalog_service.genres().await?))
}

async fn recommendations(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    Ok(Json(state.catalog_service.recommendations().await?))
}

async fn trending(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TrendingMovie>>> {
    Ok(Json(state.catalog_service.trending().await?))
}

/// Active posts of a movie's forum. The forum is created on first visit.
async fn forum_posts(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Vec<ForumPost>>> {
    Ok(Json(state.post_service.forum_posts(movie_id).await?))
}

async fn post_to_forum(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
    Json(input): Json<ContentInput>,
) -> AppResult<Json<Success>> {
    state
        .post_service
        .post_to_forum(&user, movie_id, &input.content)
        .await?;
    Ok(success())
}

async fn list_reviews(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Vec<ReviewListing>>> {
    Ok(Json(state.review_service.list(movie_id).await?))
}

/// Review a movie. One review per member and movie.
async fn create_review(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
    Json(input): Json<ReviewInput>,
) -> AppResult<Json<Success>> {
    state.review_service.create(user.id, movie_id, input).await?;
    Ok(success())
}

async fn delete_review(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    Path(review_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state.review_service.delete(user.id, review_id).await?;
    Ok(success())
}
