//! Create events and event_participation tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::EventId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::HostId).integer())
                    .col(ColumnDef::new(Events::MovieId).integer().not_null())
                    .col(ColumnDef::new(Events::EventTitle).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Events::EventDatetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Events::Description).text())
                    .col(
                        ColumnDef::new(Events::MaxParticipants)
                            .integer()
                            .not_null()
                            .default(20),
                    )
                    .col(
                        ColumnDef::new(Events::CurrentParticipants)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Events::Status)
                            .string_len(16)
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_host")
                            .from(Events::Table, Events::HostId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_movie")
                            .from(Events::Table, Events::MovieId)
                            .to(Movies::Table, Movies::MovieId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_host_id")
                    .table(Events::Table)
                    .col(Events::HostId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, event_datetime) for the conclude sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_events_status_datetime")
                    .table(Events::Table)
                    .col(Events::Status)
                    .col(Events::EventDatetime)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE events
                ADD CONSTRAINT chk_events_capacity
                CHECK (current_participants >= 0 AND current_participants <= max_participants);
                ",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventParticipation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventParticipation::ParticipationId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventParticipation::UserId).integer().not_null())
                    .col(ColumnDef::new(EventParticipation::EventId).integer().not_null())
                    .col(
                        ColumnDef::new(EventParticipation::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_participation_user")
                            .from(EventParticipation::Table, EventParticipation::UserId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_participation_event")
                            .from(EventParticipation::Table, EventParticipation::EventId)
                            .to(Events::Table, Events::EventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, event_id) - join once
        manager
            .create_index(
                Index::create()
                    .name("idx_event_participation_user_event")
                    .table(EventParticipation::Table)
                    .col(EventParticipation::UserId)
                    .col(EventParticipation::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_participation_event_id")
                    .table(EventParticipation::Table)
                    .col(EventParticipation::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventParticipation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Events {
    Table,
    EventId,
    HostId,
    MovieId,
    EventTitle,
    EventDatetime,
    Description,
    MaxParticipants,
    CurrentParticipants,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum EventParticipation {
    Table,
    ParticipationId,
    UserId,
    EventId,
    JoinedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    UserId,
}

#[derive(Iden)]
enum Movies {
    Table,
    MovieId,
}
