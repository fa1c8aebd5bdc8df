//! User repository.

use std::sync::Arc;

use super::audit::{AuditEntry, record};
use super::{read_error, write_error};
use crate::entities::{User, user};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;

/// Public slice of a user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct UserSummary {
    pub user_id: i32,
    pub name: String,
    pub email: String,
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Insert a new user. A taken email surfaces as `AppError::Conflict`.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> AppResult<user::Model> {
        user::ActiveModel {
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now().into()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }

    /// Stamp the last login time.
    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::LastLogin, Expr::value(Utc::now()))
            .filter(user::Column::UserId.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(read_error)?;
        Ok(())
    }

    /// All users, oldest first.
    pub async fn list_all(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find().count(self.db.as_ref()).await.map_err(read_error)
    }

    /// Delete a user and record it in the audit log, atomically.
    ///
    /// Returns `false` when no such user exists; nothing is written then.
    pub async fn delete_with_audit(&self, id: i32, audit: AuditEntry) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = User::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }

    /// Users matching `query` by name or email who are not `user_id`, not
    /// already friends with them and have no request pending either way.
    pub async fn search_candidates(
        &self,
        user_id: i32,
        query: &str,
        limit: u64,
    ) -> AppResult<Vec<UserSummary>> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));

        UserSummary::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT user_id, name, email
            FROM users
            WHERE (name ILIKE $1 OR email ILIKE $1)
              AND user_id <> $2
              AND user_id NOT IN (
                  SELECT sender_id FROM friend_requests
                  WHERE receiver_id = $2 AND status = 'pending'
                  UNION
                  SELECT receiver_id FROM friend_requests
                  WHERE sender_id = $2 AND status = 'pending'
                  UNION
                  SELECT user2_id FROM friendships WHERE user1_id = $2
                  UNION
                  SELECT user1_id FROM friendships WHERE user2_id = $2
              )
            ORDER BY name
            LIMIT $3
            ",
            [pattern.into(), user_id.into(), (limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::audit_log::{self, AuditTarget};
    use crate::repositories::AuditAction;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_user(id: i32, email: &str) -> user::Model {
        user::Model {
            user_id: id,
            email: email.to_string(),
            name: "Dana".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now().into(),
            last_login: None,
        }
    }

    fn audit_row(id: i32) -> audit_log::Model {
        audit_log::Model {
            log_id: 1,
            admin_id: Some(1),
            action_type: "DELETE".to_string(),
            target_table: AuditTarget::Users,
            target_record_id: Some(id),
            action_details: Some("Deleted user account".to_string()),
            performed_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_email_found() {
        let user = create_test_user(1, "dana@example.com");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_email("dana@example.com").await.unwrap();

        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_user() {
        let user = create_test_user(5, "new@example.com");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let created = repo.create("new@example.com", "Dana", "hash").await.unwrap();

        assert_eq!(created.user_id, 5);
        assert_eq!(created.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_delete_with_audit_missing_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let entry = AuditEntry::new(1, AuditAction::Delete, AuditTarget::Users, "Deleted user account");

        assert!(!repo.delete_with_audit(9, entry).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_with_audit_writes_log() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[audit_row(9)]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let entry = AuditEntry::new(1, AuditAction::Delete, AuditTarget::Users, "Deleted user account");

        assert!(repo.delete_with_audit(9, entry).await.unwrap());
    }
}
