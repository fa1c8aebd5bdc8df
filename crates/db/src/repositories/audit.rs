//! Audit log repository.
//!
//! Rows are written through [`record`] on the same connection or transaction
//! as the mutation they describe. Nothing here updates or deletes them.

use std::sync::Arc;

use crate::entities::audit_log::{self, AuditTarget};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Set,
    Statement, prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

use super::read_error;

/// What an admin did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
    ModerateApprove,
    ModerateReject,
}

impl AuditAction {
    /// Stored form of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::ModerateApprove => "MODERATE_APPROVE",
            Self::ModerateReject => "MODERATE_REJECT",
        }
    }
}

/// One audit row to be written alongside a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub admin_id: i32,
    pub action: AuditAction,
    pub target: AuditTarget,
    pub target_record_id: Option<i32>,
    pub details: String,
}

impl AuditEntry {
    #[must_use]
    pub fn new(
        admin_id: i32,
        action: AuditAction,
        target: AuditTarget,
        details: impl Into<String>,
    ) -> Self {
        Self {
            admin_id,
            action,
            target,
            target_record_id: None,
            details: details.into(),
        }
    }

    /// Attach the id of the affected row.
    #[must_use]
    pub const fn on_record(mut self, id: i32) -> Self {
        self.target_record_id = Some(id);
        self
    }
}

/// Append an audit row using the given connection or transaction.
pub(crate) async fn record<C: ConnectionTrait>(conn: &C, entry: AuditEntry) -> Result<(), sea_orm::DbErr> {
    audit_log::ActiveModel {
        admin_id: Set(Some(entry.admin_id)),
        action_type: Set(entry.action.as_str().to_string()),
        target_table: Set(entry.target),
        target_record_id: Set(entry.target_record_id),
        action_details: Set(Some(entry.details)),
        performed_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Audit row joined with the acting admin's username.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct AuditLogListing {
    pub log_id: i32,
    pub admin_id: Option<i32>,
    pub action_type: String,
    pub target_table: String,
    pub target_record_id: Option<i32>,
    pub action_details: Option<String>,
    pub performed_at: DateTimeWithTimeZone,
    pub admin_name: String,
}

/// Read side of the audit log.
#[derive(Clone)]
pub struct AuditRepository {
    db: Arc<DatabaseConnection>,
}

impl AuditRepository {
    /// Create a new audit repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Latest entries, newest first. Rows whose admin is gone show as `System`.
    pub async fn latest(&self, limit: u64) -> AppResult<Vec<AuditLogListing>> {
        AuditLogListing::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT a.log_id, a.admin_id, a.action_type, a.target_table, a.target_record_id,
                   a.action_details, a.performed_at,
                   COALESCE(ad.username, 'System') AS admin_name
            FROM audit_log a
            LEFT JOIN admins ad ON a.admin_id = ad.admin_id
            ORDER BY a.performed_at DESC
            LIMIT $1
            ",
            [(limit as i64).into()],
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
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[test]
    fn test_action_strings() {
        assert_eq!(AuditAction::Insert.as_str(), "INSERT");
        assert_eq!(AuditAction::ModerateReject.as_str(), "MODERATE_REJECT");
    }

    #[test]
    fn test_entry_builder() {
        let entry =
            AuditEntry::new(1, AuditAction::Delete, AuditTarget::Movies, "Deleted movie").on_record(9);
        assert_eq!(entry.target_record_id, Some(9));
        assert_eq!(entry.details, "Deleted movie");
    }

    #[tokio::test]
    async fn test_latest_maps_system_rows() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![btreemap! {
                    "log_id" => Value::from(3),
                    "admin_id" => Value::Int(None),
                    "action_type" => Value::from("DELETE"),
                    "target_table" => Value::from("Users"),
                    "target_record_id" => Value::from(12),
                    "action_details" => Value::from("Deleted user account"),
                    "performed_at" => Value::from(now),
                    "admin_name" => Value::from("System"),
                }]])
                .into_connection(),
        );

        let repo = AuditRepository::new(db);
        let rows = repo.latest(50).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].admin_name, "System");
        assert_eq!(rows[0].admin_id, None);
    }
}
