//! Friendship entity.
//!
//! The pair is stored once with `user1_id < user2_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub friendship_id: i32,

    #[sea_orm(indexed)]
    pub user1_id: i32,

    #[sea_orm(indexed)]
    pub user2_id: i32,

    pub created_at: DateTimeWithTimeZone,
}

/// Order two user ids the way the table stores them.
#[must_use]
pub const fn ordered_pair(a: i32, b: i32) -> (i32, i32) {
    if a < b { (a, b) } else { (b, a) }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::User1Id",
        to = "super::user::Column::UserId",
        on_delete = "Cascade"
    )]
    User1,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::User2Id",
        to = "super::user::Column::UserId",
        on_delete = "Cascade"
    )]
    User2,
}

impl ActiveModelBehavior for ActiveModel {}
