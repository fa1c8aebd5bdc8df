//! Restricted word repository.

use std::sync::Arc;

use super::audit::{AuditEntry, record};
use super::{read_error, write_error};
use crate::entities::{RestrictedWord, restricted_word};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// Restricted word repository for database operations.
#[derive(Clone)]
pub struct RestrictedWordRepository {
    db: Arc<DatabaseConnection>,
}

impl RestrictedWordRepository {
    /// Create a new restricted word repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active words, alphabetically.
    pub async fn list_active(&self) -> AppResult<Vec<restricted_word::Model>> {
        RestrictedWord::find()
            .filter(restricted_word::Column::IsActive.eq(true))
            .order_by_asc(restricted_word::Column::RestrictedWord)
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// The bare text of every active word.
    pub async fn active_words(&self) -> AppResult<Vec<String>> {
        Ok(self
            .list_active()
            .await?
            .into_iter()
            .map(|w| w.restricted_word)
            .collect())
    }

    /// Add a word and write an audit row. A duplicate surfaces as
    /// `AppError::Conflict`.
    pub async fn create_with_audit(
        &self,
        word: &str,
        audit: AuditEntry,
    ) -> AppResult<restricted_word::Model> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let created = restricted_word::ActiveModel {
            restricted_word: Set(word.to_string()),
            added_by: Set(Some(audit.admin_id)),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_error)?;

        record(&txn, audit.on_record(created.word_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(created)
    }

    /// Remove a word and write an audit row.
    ///
    /// Returns `false` when the word does not exist.
    pub async fn delete_with_audit(&self, word_id: i32, audit: AuditEntry) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = RestrictedWord::delete_by_id(word_id)
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(word_id))
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
    use crate::entities::audit_log::AuditTarget;
    use crate::repositories::audit::AuditAction;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_word(id: i32, word: &str) -> restricted_word::Model {
        restricted_word::Model {
            word_id: id,
            restricted_word: word.to_string(),
            added_by: Some(1),
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_active_words() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_word(1, "spoiler"), create_test_word(2, "scam")]])
                .into_connection(),
        );

        let repo = RestrictedWordRepository::new(db);
        let words = repo.active_words().await.unwrap();

        assert_eq!(words, vec!["spoiler".to_string(), "scam".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_word_skips_audit() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = RestrictedWordRepository::new(db);
        let audit = AuditEntry::new(
            1,
            AuditAction::Delete,
            AuditTarget::RestrictedWords,
            "Removed restricted word",
        );

        assert!(!repo.delete_with_audit(42, audit).await.unwrap());
    }
}
