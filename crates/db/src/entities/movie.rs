//! Movie entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Runtime assumed for scheduling when a movie has no duration.
pub const DEFAULT_DURATION_MINUTES: i32 = 120;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub movie_id: i32,

    pub title: String,

    #[sea_orm(nullable)]
    pub release_year: Option<i32>,

    #[sea_orm(nullable)]
    pub duration_minutes: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub synopsis: Option<String>,

    #[sea_orm(nullable)]
    pub poster_image: Option<String>,

    /// Admin who added the movie
    #[sea_orm(nullable)]
    pub created_by: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Runtime used for the scheduling window.
    #[must_use]
    pub fn effective_duration(&self) -> i32 {
        effective_duration(self.duration_minutes)
    }
}

/// Falls back to [`DEFAULT_DURATION_MINUTES`] for unset or non-positive runtimes.
#[must_use]
pub fn effective_duration(duration_minutes: Option<i32>) -> i32 {
    match duration_minutes {
        Some(minutes) if minutes > 0 => minutes,
        _ => DEFAULT_DURATION_MINUTES,
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::CreatedBy",
        to = "super::admin::Column::AdminId",
        on_delete = "SetNull"
    )]
    Creator,
}

impl ActiveModelBehavior for ActiveModel {}
