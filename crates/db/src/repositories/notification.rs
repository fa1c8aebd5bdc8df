//! Notification repository.

use std::sync::Arc;

use super::{read_error, write_error};
use crate::entities::{
    Notification,
    notification::{self, NotificationType},
};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, prelude::DateTimeWithTimeZone,
};

/// A notification about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: i32,
    pub sender_id: Option<i32>,
    pub kind: NotificationType,
    pub reference_id: Option<i32>,
    pub message: String,
}

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new notification.
    pub async fn create(&self, new: NewNotification) -> AppResult<notification::Model> {
        notification::ActiveModel {
            user_id: Set(new.user_id),
            sender_id: Set(new.sender_id),
            notification_type: Set(new.kind),
            reference_id: Set(new.reference_id),
            message: Set(new.message),
            is_seen: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }

    /// Delete a user's notifications created before `cutoff`.
    pub async fn purge_older_than(
        &self,
        user_id: i32,
        cutoff: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::CreatedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(write_error)?;

        Ok(result.rows_affected)
    }

    /// Unseen notifications for a user, newest first.
    pub async fn unseen(&self, user_id: i32) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsSeen.eq(false))
            .order_by_desc(notification::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Count unseen notifications for a user.
    pub async fn count_unseen(&self, user_id: i32) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsSeen.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Mark all notifications as seen for a user.
    pub async fn mark_all_seen(&self, user_id: i32) -> AppResult<u64> {
        let result = Notification::update_many()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsSeen.eq(false))
            .col_expr(notification::Column::IsSeen, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(write_error)?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: i32, kind: NotificationType) -> notification::Model {
        notification::Model {
            notification_id: id,
            user_id: 2,
            sender_id: Some(9),
            notification_type: kind,
            reference_id: Some(14),
            message: "Rosa liked your post.".to_string(),
            is_seen: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification(1, NotificationType::Like)]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let created = repo
            .create(NewNotification {
                user_id: 2,
                sender_id: Some(9),
                kind: NotificationType::Like,
                reference_id: Some(14),
                message: "Rosa liked your post.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.notification_type, NotificationType::Like);
        assert!(!created.is_seen);
    }

    #[tokio::test]
    async fn test_unseen() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_notification(2, NotificationType::Comment),
                    create_test_notification(1, NotificationType::Like),
                ]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.unseen(2).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].notification_id, 2);
    }

    #[tokio::test]
    async fn test_purge_older_than() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let purged = repo.purge_older_than(2, Utc::now().into()).await.unwrap();

        assert_eq!(purged, 3);
    }
}
