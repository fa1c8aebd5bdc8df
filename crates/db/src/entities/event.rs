//! Watch event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Default capacity for user-hosted events.
pub const DEFAULT_CAPACITY: i32 = 20;

/// Lifecycle of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub event_id: i32,

    /// `None` for events created from the back office.
    #[sea_orm(nullable, indexed)]
    pub host_id: Option<i32>,

    pub movie_id: i32,

    pub event_title: String,

    #[sea_orm(indexed)]
    pub event_datetime: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub max_participants: i32,

    pub current_participants: i32,

    pub status: EventStatus,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether another participant fits.
    #[must_use]
    pub const fn has_room(&self) -> bool {
        self.current_participants < self.max_participants
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::HostId",
        to = "super::user::Column::UserId",
        on_delete = "Cascade"
    )]
    Host,

    #[sea_orm(
        belongs_to = "super::movie::Entity",
        from = "Column::MovieId",
        to = "super::movie::Column::MovieId",
        on_delete = "Cascade"
    )]
    Movie,

    #[sea_orm(has_many = "super::event_participation::Entity")]
    Participants,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movie.def()
    }
}

impl Related<super::event_participation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
