//! Restricted word list.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use reelhouse_common::AppResult;
use reelhouse_db::entities::restricted_word;
use serde::Deserialize;

use crate::{
    extractors::{CurrentUser, StaffUser},
    middleware::AppState,
    response::{Success, success},
};

/// Create restricted words router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restricted-words", get(list_words).post(add_word))
        .route("/restricted-words/{id}", delete(remove_word))
}

#[derive(Debug, Deserialize)]
struct WordInput {
    #[serde(default)]
    word: String,
}

async fn list_words(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<restricted_word::Model>>> {
    Ok(Json(state.moderation_service.restricted_words().await?))
}

async fn add_word(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Json(input): Json<WordInput>,
) -> AppResult<Json<Success>> {
    state
        .moderation_service
        .add_restricted_word(&admin, &input.word)
        .await?;
    Ok(success())
}

async fn remove_word(
    StaffUser(admin): StaffUser,
    State(state): State<AppState>,
    Path(word_id): Path<i32>,
) -> AppResult<Json<Success>> {
    state
        .moderation_service
        .remove_restricted_word(&admin, word_id)
        .await?;
    Ok(success())
}
