//! Watchlist and watch history.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::watchlist::WatchStatus,
    repositories::{
        HistoryEntry, MovieRepository, WatchlistChange, WatchlistEntry, WatchlistRepository,
    },
};
use serde::Deserialize;
use tracing::debug;

/// History rows shown on the history page.
const HISTORY_LEN: u64 = 20;

/// Body of `POST /api/watchlist`.
#[derive(Debug, Default, Deserialize)]
pub struct WatchlistInput {
    pub movie_id: Option<i32>,
    #[serde(default)]
    pub status: String,
}

/// Watchlist service.
#[derive(Clone)]
pub struct WatchlistService {
    watchlist_repo: WatchlistRepository,
    movie_repo: MovieRepository,
}

impl WatchlistService {
    /// Create a new watchlist service.
    #[must_use]
    pub const fn new(watchlist_repo: WatchlistRepository, movie_repo: MovieRepository) -> Self {
        Self {
            watchlist_repo,
            movie_repo,
        }
    }

    /// The user's watchlist, most recently touched first.
    pub async fn list(&self, user_id: i32) -> AppResult<Vec<WatchlistEntry>> {
        self.watchlist_repo.list_for_user(user_id).await
    }

    /// Add a movie or move it to another status.
    pub async fn set_status(
        &self,
        user_id: i32,
        input: WatchlistInput,
    ) -> AppResult<WatchlistChange> {
        let status = WatchStatus::parse(&input.status)
            .ok_or_else(|| AppError::BadRequest("Invalid status".to_string()))?;
        let movie_id = input
            .movie_id
            .ok_or_else(|| AppError::BadRequest("Missing movie".to_string()))?;

        if self.movie_repo.find_by_id(movie_id).await?.is_none() {
            return Err(AppError::NotFound("Movie not found".to_string()));
        }

        let change = self
            .watchlist_repo
            .set_status(user_id, movie_id, status)
            .await?;
        debug!(user_id, movie_id, ?change, "Watchlist updated");
        Ok(change)
    }

    /// Latest history rows, newest first.
    pub async fn history(&self, user_id: i32) -> AppResult<Vec<HistoryEntry>> {
        self.watchlist_repo
            .history_for_user(user_id, HISTORY_LEN)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reelhouse_db::entities::{movie, watchlist};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> WatchlistService {
        let db = Arc::new(db.into_connection());
        WatchlistService::new(WatchlistRepository::new(db.clone()), MovieRepository::new(db))
    }

    fn test_movie() -> movie::Model {
        movie::Model {
            movie_id: 4,
            title: "Stalker".to_string(),
            release_year: Some(1979),
            duration_minutes: Some(161),
            synopsis: None,
            poster_image: None,
            created_by: None,
            created_at: Utc::now().into(),
        }
    }

    fn entry(status: WatchStatus) -> watchlist::Model {
        watchlist::Model {
            watchlist_id: 1,
            user_id: 9,
            movie_id: 4,
            status,
            added_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_invalid_status() {
        let watchlist = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = watchlist
            .set_status(
                9,
                WatchlistInput {
                    movie_id: Some(4),
                    status: "abandoned".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid status");
    }

    #[tokio::test]
    async fn test_same_status_is_unchanged() {
        let watchlist = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie()]])
                .append_query_results([[entry(WatchStatus::Watching)]]),
        );

        let change = watchlist
            .set_status(
                9,
                WatchlistInput {
                    movie_id: Some(4),
                    status: "watching".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(change, WatchlistChange::Unchanged);
    }

    #[tokio::test]
    async fn test_status_change_reports_previous_status() {
        let watchlist = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie()]])
                .append_query_results([[entry(WatchStatus::ToWatch)]])
                .append_query_results([[entry(WatchStatus::Watching)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let change = watchlist
            .set_status(
                9,
                WatchlistInput {
                    movie_id: Some(4),
                    status: "watching".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            change,
            WatchlistChange::Changed {
                from: WatchStatus::ToWatch
            }
        );
    }
}
