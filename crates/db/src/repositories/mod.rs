//! Repositories. All SQL lives behind these types.

mod admin;
mod audit;
mod comment;
mod event;
mod friend;
mod message;
mod movie;
mod notification;
mod post;
mod report;
mod restricted_word;
mod review;
mod user;
mod watchlist;

pub use admin::AdminRepository;
pub use audit::{AuditAction, AuditEntry, AuditLogListing, AuditRepository};
pub use comment::{AdminCommentListing, CommentListing, CommentRepository};
pub use event::{
    AdminEventListing, EventInput, EventListing, EventRepository, HostOutcome, JoinOutcome, Slot,
};
pub use friend::{FriendRepository, PendingRequest};
pub use message::{MessageRepository, ThreadMessage};
pub use movie::{MovieInput, MovieListing, MovieRepository, RecommendedMovie, TrendingMovie};
pub use notification::{NewNotification, NotificationRepository};
pub use post::{
    AdminPostListing, ForumPost, ModerationItem, PostListing, PostRepository, ProfilePost,
};
pub use report::{
    ActiveUserReport, AdminStats, ForumReport, HighestRatedReport, ReportRepository,
    TopMovieReport, TopWatched,
};
pub use restricted_word::RestrictedWordRepository;
pub use review::{ReviewBrief, ReviewListing, ReviewRepository};
pub use user::{UserRepository, UserSummary};
pub use watchlist::{HistoryEntry, WatchlistBrief, WatchlistChange, WatchlistEntry, WatchlistRepository};

use reelhouse_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map a write error, keeping unique-key violations distinguishable.
pub(crate) fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(err.to_string()),
    }
}

pub(crate) fn read_error(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_are_database_errors() {
        let err = write_error(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.is_conflict());
    }
}
