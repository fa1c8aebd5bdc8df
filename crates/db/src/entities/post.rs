//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation state shared by posts and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "flagged")]
    Flagged,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "removed")]
    Removed,
}

impl ContentStatus {
    /// Whether the item sits in the moderation queue.
    #[must_use]
    pub const fn awaits_moderation(self) -> bool {
        matches!(self, Self::Flagged | Self::UnderReview)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub post_id: i32,

    #[sea_orm(indexed)]
    pub user_id: i32,

    /// Cleared when the forum's movie is deleted.
    #[sea_orm(nullable, indexed)]
    pub forum_id: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub status: ContentStatus,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::UserId",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::discussion_forum::Entity",
        from = "Column::ForumId",
        to = "super::discussion_forum::Column::ForumId",
        on_delete = "SetNull"
    )]
    Forum,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::like::Entity")]
    Likes,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
