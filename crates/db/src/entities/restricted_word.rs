//! Restricted word entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restricted_words")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub word_id: i32,

    #[sea_orm(unique)]
    pub restricted_word: String,

    #[sea_orm(nullable)]
    pub added_by: Option<i32>,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::AddedBy",
        to = "super::admin::Column::AdminId",
        on_delete = "SetNull"
    )]
    Admin,
}

impl ActiveModelBehavior for ActiveModel {}
