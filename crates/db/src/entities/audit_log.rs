//! Audit log entity. Rows are only ever inserted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Logical table an audit row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AuditTarget {
    #[sea_orm(string_value = "Users")]
    Users,
    #[sea_orm(string_value = "Movies")]
    Movies,
    #[sea_orm(string_value = "Posts")]
    Posts,
    #[sea_orm(string_value = "Comments")]
    Comments,
    #[sea_orm(string_value = "Events")]
    Events,
    #[sea_orm(string_value = "RestrictedWords")]
    RestrictedWords,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub log_id: i32,

    /// `None` once the acting admin is gone.
    #[sea_orm(nullable)]
    pub admin_id: Option<i32>,

    /// `INSERT`, `UPDATE`, `DELETE`, `MODERATE_APPROVE` or `MODERATE_REJECT`
    pub action_type: String,

    pub target_table: AuditTarget,

    #[sea_orm(nullable)]
    pub target_record_id: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub action_details: Option<String>,

    #[sea_orm(indexed)]
    pub performed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::AdminId",
        to = "super::admin::Column::AdminId",
        on_delete = "SetNull"
    )]
    Admin,
}

impl ActiveModelBehavior for ActiveModel {}
