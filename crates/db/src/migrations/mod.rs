//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_account_tables;
mod m20250601_000002_create_catalog_tables;
mod m20250601_000003_create_watchlist_tables;
mod m20250601_000004_create_forum_tables;
mod m20250601_000005_create_event_tables;
mod m20250601_000006_create_social_tables;
mod m20250601_000007_create_moderation_tables;
mod m20250601_000008_create_top_watched_view;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_account_tables::Migration),
            Box::new(m20250601_000002_create_catalog_tables::Migration),
            Box::new(m20250601_000003_create_watchlist_tables::Migration),
            Box::new(m20250601_000004_create_forum_tables::Migration),
            Box::new(m20250601_000005_create_event_tables::Migration),
            Box::new(m20250601_000006_create_social_tables::Migration),
            Box::new(m20250601_000007_create_moderation_tables::Migration),
            Box::new(m20250601_000008_create_top_watched_view::Migration),
        ]
    }
}
