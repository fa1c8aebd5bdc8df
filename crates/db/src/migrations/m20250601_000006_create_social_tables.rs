//! Create friendships, friend_requests, private_messages and notifications tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friendships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendships::FriendshipId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Friendships::User1Id).integer().not_null())
                    .col(ColumnDef::new(Friendships::User2Id).integer().not_null())
                    .col(
                        ColumnDef::new(Friendships::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendships_user1")
                            .from(Friendships::Table, Friendships::User1Id)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendships_user2")
                            .from(Friendships::Table, Friendships::User2Id)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user1_id, user2_id) - one row per unordered pair
        manager
            .create_index(
                Index::create()
                    .name("idx_friendships_pair")
                    .table(Friendships::Table)
                    .col(Friendships::User1Id)
                    .col(Friendships::User2Id)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_friendships_user2_id")
                    .table(Friendships::Table)
                    .col(Friendships::User2Id)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE friendships
                ADD CONSTRAINT chk_friendships_order CHECK (user1_id < user2_id);
                ",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FriendRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FriendRequests::RequestId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FriendRequests::SenderId).integer().not_null())
                    .col(ColumnDef::new(FriendRequests::ReceiverId).integer().not_null())
                    .col(
                        ColumnDef::new(FriendRequests::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(FriendRequests::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(FriendRequests::RespondedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_requests_sender")
                            .from(FriendRequests::Table, FriendRequests::SenderId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_requests_receiver")
                            .from(FriendRequests::Table, FriendRequests::ReceiverId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (sender_id, receiver_id) - prevent duplicate requests
        manager
            .create_index(
                Index::create()
                    .name("idx_friend_requests_sender_receiver")
                    .table(FriendRequests::Table)
                    .col(FriendRequests::SenderId)
                    .col(FriendRequests::ReceiverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_friend_requests_receiver_status")
                    .table(FriendRequests::Table)
                    .col(FriendRequests::ReceiverId)
                    .col(FriendRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrivateMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrivateMessages::MessageId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PrivateMessages::SenderId).integer().not_null())
                    .col(ColumnDef::new(PrivateMessages::ReceiverId).integer().not_null())
                    .col(ColumnDef::new(PrivateMessages::Content).text().not_null())
                    .col(
                        ColumnDef::new(PrivateMessages::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PrivateMessages::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PrivateMessages::ReadAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_private_messages_sender")
                            .from(PrivateMessages::Table, PrivateMessages::SenderId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_private_messages_receiver")
                            .from(PrivateMessages::Table, PrivateMessages::ReceiverId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (sender_id, receiver_id, sent_at) for thread lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_private_messages_thread")
                    .table(PrivateMessages::Table)
                    .col(PrivateMessages::SenderId)
                    .col(PrivateMessages::ReceiverId)
                    .col(PrivateMessages::SentAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::NotificationId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).integer().not_null())
                    .col(ColumnDef::new(Notifications::SenderId).integer())
                    .col(
                        ColumnDef::new(Notifications::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::ReferenceId).integer())
                    .col(ColumnDef::new(Notifications::Message).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Notifications::IsSeen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_sender")
                            .from(Notifications::Table, Notifications::SenderId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_user_seen")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::IsSeen)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PrivateMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FriendRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Friendships::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friendships {
    Table,
    FriendshipId,
    User1Id,
    User2Id,
    CreatedAt,
}

#[derive(Iden)]
enum FriendRequests {
    Table,
    RequestId,
    SenderId,
    ReceiverId,
    Status,
    SentAt,
    RespondedAt,
}

#[derive(Iden)]
enum PrivateMessages {
    Table,
    MessageId,
    SenderId,
    ReceiverId,
    Content,
    IsRead,
    SentAt,
    ReadAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    NotificationId,
    UserId,
    SenderId,
    NotificationType,
    ReferenceId,
    Message,
    IsSeen,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    UserId,
}
