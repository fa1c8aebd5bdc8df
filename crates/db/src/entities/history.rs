//! Watch history entity.
//!
//! One row per watchlist transition; rows are never updated.

use super::watchlist::WatchStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What happened to the watchlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    #[sea_orm(string_value = "added_to_watchlist")]
    AddedToWatchlist,
    #[sea_orm(string_value = "status_changed")]
    StatusChanged,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub history_id: i32,

    #[sea_orm(indexed)]
    pub user_id: i32,

    pub movie_id: i32,

    pub action_type: HistoryAction,

    #[sea_orm(nullable)]
    pub status_before: Option<WatchStatus>,

    #[sea_orm(nullable)]
    pub status_after: Option<WatchStatus>,

    pub action_date: DateTimeWithTimeZone,
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
