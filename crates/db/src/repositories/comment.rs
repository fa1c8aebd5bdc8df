//! Comment repository.

use std::sync::Arc;

use super::audit::{AuditEntry, record};
use super::{read_error, write_error};
use crate::entities::{
    Comment,
    comment::{self, ContentStatus},
};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    QueryFilter, Set, Statement, TransactionTrait, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct CommentListing {
    pub comment_id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct AdminCommentListing {
    pub comment_id: i32,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub status: String,
    pub author: String,
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Active comments of a post, oldest first.
    pub async fn list_active(&self, post_id: i32) -> AppResult<Vec<CommentListing>> {
        CommentListing::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT c.comment_id, c.post_id, c.user_id, c.content, c.created_at,
                   u.name AS author_name
            FROM comments c
            JOIN users u ON c.user_id = u.user_id
            WHERE c.post_id = $1 AND c.status = 'active'
            ORDER BY c.created_at ASC
            ",
            [post_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Every comment of a post regardless of status.
    pub async fn list_for_admin(&self, post_id: i32) -> AppResult<Vec<AdminCommentListing>> {
        AdminCommentListing::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT c.comment_id, c.content, c.created_at, c.status, u.name AS author
            FROM comments c
            JOIN users u ON c.user_id = u.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            ",
            [post_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Insert a comment.
    pub async fn create(
        &self,
        post_id: i32,
        user_id: i32,
        content: &str,
        status: ContentStatus,
    ) -> AppResult<comment::Model> {
        comment::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            status: Set(status),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }

    /// Move an active comment into the review queue.
    pub async fn report(&self, comment_id: i32) -> AppResult<bool> {
        let result = Comment::update_many()
            .col_expr(comment::Column::Status, Expr::value(ContentStatus::UnderReview))
            .filter(comment::Column::CommentId.eq(comment_id))
            .filter(comment::Column::Status.eq(ContentStatus::Active))
            .exec(self.db.as_ref())
            .await
            .map_err(read_error)?;
        Ok(result.rows_affected > 0)
    }

    /// Delete a comment and write an audit row.
    ///
    /// Returns `false` when the comment does not exist.
    pub async fn delete_with_audit(&self, comment_id: i32, audit: AuditEntry) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Comment::delete_by_id(comment_id)
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(comment_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }

    /// Set a comment's moderation status and write an audit row.
    ///
    /// Returns `false` when the comment does not exist.
    pub async fn moderate_with_audit(
        &self,
        comment_id: i32,
        status: ContentStatus,
        audit: AuditEntry,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Comment::update_many()
            .col_expr(comment::Column::Status, Expr::value(status))
            .filter(comment::Column::CommentId.eq(comment_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(comment_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::audit_log::{self, AuditTarget};
    use crate::repositories::AuditAction;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_comment(id: i32, status: ContentStatus) -> comment::Model {
        comment::Model {
            comment_id: id,
            post_id: 1,
            user_id: 5,
            content: "Agreed!".to_string(),
            status,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_comment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment(8, ContentStatus::Active)]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let created = repo.create(1, 5, "Agreed!", ContentStatus::Active).await.unwrap();

        assert_eq!(created.comment_id, 8);
        assert_eq!(created.status, ContentStatus::Active);
    }

    #[tokio::test]
    async fn test_moderate_with_audit() {
        let audit_row = audit_log::Model {
            log_id: 1,
            admin_id: Some(1),
            action_type: "MODERATE_REJECT".to_string(),
            target_table: AuditTarget::Comments,
            target_record_id: Some(8),
            action_details: Some("rejected flagged content.".to_string()),
            performed_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[audit_row]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let audit = AuditEntry::new(
            1,
            AuditAction::ModerateReject,
            AuditTarget::Comments,
            "rejected flagged content.",
        );

        assert!(
            repo.moderate_with_audit(8, ContentStatus::Removed, audit)
                .await
                .unwrap()
        );
    }
}
