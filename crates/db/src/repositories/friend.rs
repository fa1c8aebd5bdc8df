//! Friendship and friend request repository.

use std::sync::Arc;

use super::user::UserSummary;
use super::{read_error, write_error};
use crate::entities::{
    FriendRequest, Friendship,
    friend_request::{self, FriendRequestStatus},
    friendship::{self, ordered_pair},
};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set, Statement, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;

/// A pending request as shown to its receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct PendingRequest {
    pub request_id: i32,
    pub sender_id: i32,
    pub name: String,
    pub email: String,
}

/// Friend repository for database operations.
#[derive(Clone)]
pub struct FriendRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendRepository {
    /// Create a new friend repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether two users share a friendship row.
    pub async fn are_friends(&self, a: i32, b: i32) -> AppResult<bool> {
        let (user1, user2) = ordered_pair(a, b);
        let count = Friendship::find()
            .filter(friendship::Column::User1Id.eq(user1))
            .filter(friendship::Column::User2Id.eq(user2))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)?;
        Ok(count > 0)
    }

    /// Friends of a user, by name.
    pub async fn list_friends(&self, user_id: i32) -> AppResult<Vec<UserSummary>> {
        UserSummary::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT u.user_id, u.name, u.email
            FROM friendships f
            JOIN users u
              ON u.user_id = CASE WHEN f.user1_id = $1 THEN f.user2_id ELSE f.user1_id END
            WHERE f.user1_id = $1 OR f.user2_id = $1
            ORDER BY u.name ASC
            ",
            [user_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Number of accepted friendships a user is part of.
    pub async fn count_friends(&self, user_id: i32) -> AppResult<u64> {
        Friendship::find()
            .filter(
                Condition::any()
                    .add(friendship::Column::User1Id.eq(user_id))
                    .add(friendship::Column::User2Id.eq(user_id)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Requests between two users in either direction.
    pub async fn requests_between(&self, a: i32, b: i32) -> AppResult<Vec<friend_request::Model>> {
        FriendRequest::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(friend_request::Column::SenderId.eq(a))
                            .add(friend_request::Column::ReceiverId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(friend_request::Column::SenderId.eq(b))
                            .add(friend_request::Column::ReceiverId.eq(a)),
                    ),
            )
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Insert a pending request. A repeat surfaces as `AppError::Conflict`.
    pub async fn create_request(
        &self,
        sender_id: i32,
        receiver_id: i32,
    ) -> AppResult<friend_request::Model> {
        friend_request::ActiveModel {
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            status: Set(FriendRequestStatus::Pending),
            sent_at: Set(Utc::now().into()),
            responded_at: Set(None),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }

    /// Put an answered request back to pending.
    pub async fn reopen_request(&self, request_id: i32) -> AppResult<bool> {
        let result = FriendRequest::update_many()
            .col_expr(
                friend_request::Column::Status,
                Expr::value(FriendRequestStatus::Pending),
            )
            .col_expr(friend_request::Column::SentAt, Expr::value(Utc::now()))
            .col_expr(
                friend_request::Column::RespondedAt,
                Expr::value(Option::<chrono::DateTime<Utc>>::None),
            )
            .filter(friend_request::Column::RequestId.eq(request_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected > 0)
    }

    /// Pending requests received by a user, newest first.
    pub async fn pending_for(&self, receiver_id: i32) -> AppResult<Vec<PendingRequest>> {
        PendingRequest::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT fr.request_id, fr.sender_id, u.name, u.email
            FROM friend_requests fr
            JOIN users u ON fr.sender_id = u.user_id
            WHERE fr.receiver_id = $1 AND fr.status = 'pending'
            ORDER BY fr.sent_at DESC
            ",
            [receiver_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// A pending request addressed to `receiver_id`.
    pub async fn find_pending_for_receiver(
        &self,
        request_id: i32,
        receiver_id: i32,
    ) -> AppResult<Option<friend_request::Model>> {
        FriendRequest::find_by_id(request_id)
            .filter(friend_request::Column::ReceiverId.eq(receiver_id))
            .filter(friend_request::Column::Status.eq(FriendRequestStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Answer a pending request. Accepting also stores the friendship, in
    /// the same transaction.
    ///
    /// Returns `false` when the request was no longer pending.
    pub async fn respond(
        &self,
        request: &friend_request::Model,
        accept: bool,
    ) -> AppResult<bool> {
        let status = if accept {
            FriendRequestStatus::Accepted
        } else {
            FriendRequestStatus::Declined
        };

        let txn = self.db.begin().await.map_err(read_error)?;

        let result = FriendRequest::update_many()
            .col_expr(friend_request::Column::Status, Expr::value(status))
            .col_expr(friend_request::Column::RespondedAt, Expr::value(Utc::now()))
            .filter(friend_request::Column::RequestId.eq(request.request_id))
            .filter(friend_request::Column::Status.eq(FriendRequestStatus::Pending))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        if accept {
            let (user1, user2) = ordered_pair(request.sender_id, request.receiver_id);
            Friendship::insert(friendship::ActiveModel {
                user1_id: Set(user1),
                user2_id: Set(user2),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::columns([friendship::Column::User1Id, friendship::Column::User2Id])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(write_error)?;
        }

        txn.commit().await.map_err(read_error)?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_request(id: i32, status: FriendRequestStatus) -> friend_request::Model {
        friend_request::Model {
            request_id: id,
            sender_id: 9,
            receiver_id: 2,
            status,
            sent_at: Utc::now().into(),
            responded_at: None,
        }
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[tokio::test]
    async fn test_are_friends() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => Value::BigInt(Some(1)),
                }]])
                .into_connection(),
        );

        let repo = FriendRepository::new(db);
        assert!(repo.are_friends(9, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_accept_writes_friendship() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        let repo = FriendRepository::new(db);
        let request = create_test_request(5, FriendRequestStatus::Pending);

        assert!(repo.respond(&request, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_respond_to_answered_request() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = FriendRepository::new(db);
        let request = create_test_request(5, FriendRequestStatus::Declined);

        assert!(!repo.respond(&request, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_for() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "request_id" => Value::from(5),
                    "sender_id" => Value::from(9),
                    "name" => Value::from("Rosa"),
                    "email" => Value::from("rosa@example.com"),
                }]])
                .into_connection(),
        );

        let repo = FriendRepository::new(db);
        let pending = repo.pending_for(2).await.unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "Rosa");
    }
}
