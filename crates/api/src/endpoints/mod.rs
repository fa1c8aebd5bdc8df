//! API endpoints.

mod admin;
mod auth;
mod events;
mod friends;
mod messages;
mod movies;
mod notifications;
mod posts;
mod reports;
mod restricted_words;
mod watchlist;

use axum::Router;

use crate::middleware::AppState;

pub use auth::landing;

/// Create the API router, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(movies::router())
        .merge(posts::router())
        .merge(events::router())
        .merge(watchlist::router())
        .merge(friends::router())
        .merge(messages::router())
        .merge(notifications::router())
        .merge(restricted_words::router())
        .nest("/admin", admin::router())
        .nest("/reports", reports::router())
}
