//! Admin account repository.

use std::sync::Arc;

use super::{read_error, write_error};
use crate::entities::{Admin, admin};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Admin repository for database operations.
#[derive(Clone)]
pub struct AdminRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminRepository {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an admin by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<admin::Model>> {
        Admin::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Find an admin by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<admin::Model>> {
        Admin::find()
            .filter(admin::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Find an admin by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<admin::Model>> {
        Admin::find()
            .filter(admin::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Insert a new admin. Taken email or username surfaces as `AppError::Conflict`.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: admin::AdminRole,
    ) -> AppResult<admin::Model> {
        admin::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(username.to_string()),
            role: Set(role),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }
}
