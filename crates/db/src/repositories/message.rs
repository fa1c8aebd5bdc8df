//! Private message repository.

use std::sync::Arc;

use super::{read_error, write_error};
use crate::entities::{PrivateMessage, private_message};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, Set, Statement, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;

/// A message seen from one side of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ThreadMessage {
    pub message_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub is_read: bool,
    pub sent_at: DateTimeWithTimeZone,
    pub read_at: Option<DateTimeWithTimeZone>,
    /// `sent` or `received`.
    #[serde(rename = "type")]
    pub direction: String,
}

/// Private message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a message.
    pub async fn create(
        &self,
        sender_id: i32,
        receiver_id: i32,
        content: &str,
    ) -> AppResult<private_message::Model> {
        private_message::ActiveModel {
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            content: Set(content.to_string()),
            is_read: Set(false),
            sent_at: Set(Utc::now().into()),
            read_at: Set(None),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }

    /// Mark everything `friend_id` sent to `user_id` as read.
    pub async fn mark_thread_read(&self, user_id: i32, friend_id: i32) -> AppResult<u64> {
        let result = PrivateMessage::update_many()
            .col_expr(private_message::Column::IsRead, Expr::value(true))
            .col_expr(private_message::Column::ReadAt, Expr::value(Utc::now()))
            .filter(private_message::Column::SenderId.eq(friend_id))
            .filter(private_message::Column::ReceiverId.eq(user_id))
            .filter(private_message::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(write_error)?;

        Ok(result.rows_affected)
    }

    /// Both directions of a conversation, oldest first.
    pub async fn thread(&self, user_id: i32, friend_id: i32) -> AppResult<Vec<ThreadMessage>> {
        ThreadMessage::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT m.message_id, m.sender_id, m.receiver_id, m.content, m.is_read,
                   m.sent_at, m.read_at,
                   CASE WHEN m.sender_id = $1 THEN 'sent' ELSE 'received' END AS direction
            FROM private_messages m
            WHERE (m.sender_id = $1 AND m.receiver_id = $2)
               OR (m.sender_id = $2 AND m.receiver_id = $1)
            ORDER BY m.sent_at ASC
            ",
            [user_id.into(), friend_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Messages addressed to a user that are still unread.
    pub async fn count_unread(&self, user_id: i32) -> AppResult<u64> {
        PrivateMessage::find()
            .filter(private_message::Column::ReceiverId.eq(user_id))
            .filter(private_message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    #[tokio::test]
    async fn test_thread_labels_direction() {
        let sent_at: DateTimeWithTimeZone = Utc::now().into();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "message_id" => Value::from(1),
                    "sender_id" => Value::from(2),
                    "receiver_id" => Value::from(9),
                    "content" => Value::from("Tonight?"),
                    "is_read" => Value::from(true),
                    "sent_at" => Value::from(sent_at),
                    "read_at" => Value::ChronoDateTimeWithTimeZone(None),
                    "direction" => Value::from("sent"),
                }]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let thread = repo.thread(2, 9).await.unwrap();

        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].direction, "sent");
        let json = serde_json::to_value(&thread[0]).unwrap();
        assert_eq!(json["type"], "sent");
    }

    #[tokio::test]
    async fn test_mark_thread_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        assert_eq!(repo.mark_thread_read(2, 9).await.unwrap(), 2);
    }
}
