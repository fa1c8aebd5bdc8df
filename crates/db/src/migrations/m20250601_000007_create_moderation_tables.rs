//! Create restricted_words and audit_log tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RestrictedWords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RestrictedWords::WordId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RestrictedWords::RestrictedWord)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RestrictedWords::AddedBy).integer())
                    .col(
                        ColumnDef::new(RestrictedWords::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RestrictedWords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restricted_words_added_by")
                            .from(RestrictedWords::Table, RestrictedWords::AddedBy)
                            .to(Admins::Table, Admins::AdminId)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_restricted_words_word")
                    .table(RestrictedWords::Table)
                    .col(RestrictedWords::RestrictedWord)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLog::LogId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLog::AdminId).integer())
                    .col(ColumnDef::new(AuditLog::ActionType).string_len(32).not_null())
                    .col(ColumnDef::new(AuditLog::TargetTable).string_len(32).not_null())
                    .col(ColumnDef::new(AuditLog::TargetRecordId).integer())
                    .col(ColumnDef::new(AuditLog::ActionDetails).text())
                    .col(
                        ColumnDef::new(AuditLog::PerformedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_log_admin")
                            .from(AuditLog::Table, AuditLog::AdminId)
                            .to(Admins::Table, Admins::AdminId)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_performed_at")
                    .table(AuditLog::Table)
                    .col(AuditLog::PerformedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RestrictedWords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RestrictedWords {
    Table,
    WordId,
    RestrictedWord,
    AddedBy,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum AuditLog {
    Table,
    LogId,
    AdminId,
    ActionType,
    TargetTable,
    TargetRecordId,
    ActionDetails,
    PerformedAt,
}

#[derive(Iden)]
enum Admins {
    Table,
    AdminId,
}
