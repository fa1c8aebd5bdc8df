//! Back-office reports.

use axum::{Json, Router, extract::State, routing::get};
use reelhouse_common::AppResult;
use reelhouse_db::repositories::{
    ActiveUserReport, ForumReport, HighestRatedReport, TopMovieReport,
};

use crate::{extractors::StaffUser, middleware::AppState};

/// Create reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/top-movies", get(top_movies))
        .route("/highest-rated", get(highest_rated))
        .route("/active-users", get(active_users))
        .route("/popular-forums", get(popular_forums))
}

/// Most completed movies.
async fn top_movies(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TopMovieReport>>> {
    Ok(Json(state.admin_service.top_movies().await?))
}

async fn highest_rated(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HighestRatedReport>>> {
    Ok(Json(state.admin_service.highest_rated().await?))
}

/// Members ranked by posts, comments and reviews combined.
async fn active_users(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ActiveUserReport>>> {
    Ok(Json(state.admin_service.active_users().await?))
}

async fn popular_forums(
    StaffUser(_): StaffUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ForumReport>>> {
    Ok(Json(state.admin_service.popular_forums().await?))
}
