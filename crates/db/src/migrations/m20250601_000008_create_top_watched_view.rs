//! Create the view ranking movies by completed watchlist entries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE OR REPLACE VIEW view_top10_watched AS
                SELECT m.movie_id, m.title, COUNT(w.watchlist_id) AS completion_count
                FROM movies m
                JOIN watchlist w ON w.movie_id = m.movie_id
                WHERE w.status = 'completed'
                GROUP BY m.movie_id, m.title
                ORDER BY completion_count DESC
                LIMIT 10;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP VIEW IF EXISTS view_top10_watched;")
            .await?;

        Ok(())
    }
}
