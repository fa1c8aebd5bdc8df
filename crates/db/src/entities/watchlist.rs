//! Watchlist entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where a movie sits on a user's watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum WatchStatus {
    #[sea_orm(string_value = "to-watch")]
    #[serde(rename = "to-watch")]
    ToWatch,
    #[sea_orm(string_value = "watching")]
    #[serde(rename = "watching")]
    Watching,
    #[sea_orm(string_value = "completed")]
    #[serde(rename = "completed")]
    Completed,
}

impl WatchStatus {
    /// Parse the wire representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "to-watch" => Some(Self::ToWatch),
            "watching" => Some(Self::Watching),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// The wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToWatch => "to-watch",
            Self::Watching => "watching",
            Self::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watchlist")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub watchlist_id: i32,

    #[sea_orm(indexed)]
    pub user_id: i32,

    pub movie_id: i32,

    pub status: WatchStatus,

    pub added_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
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
        belongs_to = "super::movie::Entity",
        from = "Column::MovieId",
        to = "super::movie::Column::MovieId",
        on_delete = "Cascade"
    )]
    Movie,
}

impl ActiveModelBehavior for ActiveModel {}
