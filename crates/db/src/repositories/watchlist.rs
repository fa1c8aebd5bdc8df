//! Watchlist and watch history repository.

use std::sync::Arc;

use super::{read_error, write_error};
use crate::entities::{
    History, Watchlist,
    history::{self, HistoryAction},
    watchlist::{self, WatchStatus},
};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, Set, Statement, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

/// Outcome of a watchlist status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistChange {
    /// New entry.
    Added,
    /// Existing entry moved from the given status.
    Changed { from: WatchStatus },
    /// Entry already had the requested status.
    Unchanged,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct WatchlistEntry {
    pub watchlist_id: i32,
    pub status: String,
    pub updated_at: DateTimeWithTimeZone,
    pub title: String,
    pub movie_id: i32,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct WatchlistBrief {
    pub title: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct HistoryEntry {
    pub action_type: String,
    pub action_date: DateTimeWithTimeZone,
    pub status_before: Option<String>,
    pub status_after: Option<String>,
    pub title: String,
}

/// Watchlist repository for database operations.
#[derive(Clone)]
pub struct WatchlistRepository {
    db: Arc<DatabaseConnection>,
}

impl WatchlistRepository {
    /// Create a new watchlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A user's watchlist, most recently touched first.
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<WatchlistEntry>> {
        WatchlistEntry::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT w.watchlist_id, w.status, w.updated_at, m.title, m.movie_id
            FROM watchlist w
            JOIN movies m ON w.movie_id = m.movie_id
            WHERE w.user_id = $1
            ORDER BY w.updated_at DESC
            ",
            [user_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Latest watchlist entries for the dashboard.
    pub async fn recent_for_user(&self, user_id: i32, limit: u64) -> AppResult<Vec<WatchlistBrief>> {
        WatchlistBrief::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT m.title, w.status
            FROM watchlist w
            JOIN movies m ON w.movie_id = m.movie_id
            WHERE w.user_id = $1
            ORDER BY w.updated_at DESC
            LIMIT $2
            ",
            [user_id.into(), (limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Latest history entries, newest first.
    pub async fn history_for_user(&self, user_id: i32, limit: u64) -> AppResult<Vec<HistoryEntry>> {
        HistoryEntry::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT h.action_type, h.action_date, h.status_before, h.status_after, m.title
            FROM history h
            JOIN movies m ON h.movie_id = m.movie_id
            WHERE h.user_id = $1
            ORDER BY h.action_date DESC, h.history_id DESC
            LIMIT $2
            ",
            [user_id.into(), (limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Count a user's completed movies.
    pub async fn count_completed(&self, user_id: i32) -> AppResult<u64> {
        Watchlist::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::Status.eq(WatchStatus::Completed))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Count completed entries across all users.
    pub async fn count_all_completed(&self) -> AppResult<u64> {
        Watchlist::find()
            .filter(watchlist::Column::Status.eq(WatchStatus::Completed))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Add or move a watchlist entry, appending at most one history row.
    pub async fn set_status(
        &self,
        user_id: i32,
        movie_id: i32,
        status: WatchStatus,
    ) -> AppResult<WatchlistChange> {
        let txn = self.db.begin().await.map_err(read_error)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let existing = Watchlist::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::MovieId.eq(movie_id))
            .one(&txn)
            .await
            .map_err(read_error)?;

        let change = match existing {
            None => {
                watchlist::ActiveModel {
                    user_id: Set(user_id),
                    movie_id: Set(movie_id),
                    status: Set(status),
                    added_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(write_error)?;

                append_history(&txn, user_id, movie_id, HistoryAction::AddedToWatchlist, None, status)
                    .await
                    .map_err(write_error)?;
                WatchlistChange::Added
            }
            Some(entry) if entry.status == status => WatchlistChange::Unchanged,
            Some(entry) => {
                let from = entry.status;
                let mut active: watchlist::ActiveModel = entry.into();
                active.status = Set(status);
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(write_error)?;

                let action = if status == WatchStatus::Completed {
                    HistoryAction::Completed
                } else {
                    HistoryAction::StatusChanged
                };
                append_history(&txn, user_id, movie_id, action, Some(from), status)
                    .await
                    .map_err(write_error)?;
                WatchlistChange::Changed { from }
            }
        };

        txn.commit().await.map_err(read_error)?;
        Ok(change)
    }
}

/// Mark a movie completed for a user and append a `completed` history row.
pub(crate) async fn complete_in<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    movie_id: i32,
) -> Result<(), DbErr> {
    let now: DateTimeWithTimeZone = Utc::now().into();

    let existing = Watchlist::find()
        .filter(watchlist::Column::UserId.eq(user_id))
        .filter(watchlist::Column::MovieId.eq(movie_id))
        .one(conn)
        .await?;

    let before = match existing {
        Some(entry) => {
            let before = entry.status;
            let mut active: watchlist::ActiveModel = entry.into();
            active.status = Set(WatchStatus::Completed);
            active.updated_at = Set(now);
            active.update(conn).await?;
            Some(before)
        }
        None => {
            watchlist::ActiveModel {
                user_id: Set(user_id),
                movie_id: Set(movie_id),
                status: Set(WatchStatus::Completed),
                added_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            None
        }
    };

    append_history(
        conn,
        user_id,
        movie_id,
        HistoryAction::Completed,
        before,
        WatchStatus::Completed,
    )
    .await
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    movie_id: i32,
    action: HistoryAction,
    before: Option<WatchStatus>,
    after: WatchStatus,
) -> Result<(), DbErr> {
    History::insert(history::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(movie_id),
        action_type: Set(action),
        status_before: Set(before),
        status_after: Set(Some(after)),
        action_date: Set(Utc::now().into()),
        ..Default::default()
    })
    .exec_without_returning(conn)
    .await?;

    Ok(())
}
