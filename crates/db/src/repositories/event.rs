//! Watch event repository.

use std::sync::Arc;

use super::audit::{AuditEntry, record};
use super::watchlist::complete_in;
use super::{read_error, write_error};
use crate::entities::{
    Event, EventParticipation,
    event::{self, DEFAULT_CAPACITY, EventStatus},
    event_participation,
    movie::DEFAULT_DURATION_MINUTES,
};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
    TransactionTrait, Value,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Query},
};
use serde::Serialize;

/// Fields an event is created or edited with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInput {
    pub title: String,
    pub movie_id: i32,
    pub event_datetime: DateTimeWithTimeZone,
    pub description: Option<String>,
    /// Defaults to [`DEFAULT_CAPACITY`] on create; ignored on update.
    pub capacity: Option<i32>,
}

/// First argument of the advisory lock that serializes one user's schedule.
const SCHEDULE_LOCK_CLASS: i32 = 4_201;

/// Events hosted by `$1` that overlap `[$2, $3)`.
const HOSTED_OVERLAP_SQL: &str = r"
    SELECT COUNT(*) AS num_items
    FROM events e
    LEFT JOIN movies m ON m.movie_id = e.movie_id
    WHERE e.status <> 'cancelled'
      AND e.host_id = $1
      AND e.event_datetime < $3
      AND e.event_datetime + make_interval(
            mins => CASE WHEN m.duration_minutes > 0 THEN m.duration_minutes ELSE $4 END
          ) > $2
";

/// Events hosted or joined by `$1` that overlap `[$2, $3)`. A participation
/// in event `$5` itself is left to the unique key.
const COMMITTED_OVERLAP_SQL: &str = r"
    SELECT COUNT(*) AS num_items
    FROM events e
    LEFT JOIN movies m ON m.movie_id = e.movie_id
    WHERE e.status <> 'cancelled'
      AND (e.host_id = $1
           OR e.event_id IN (
               SELECT event_id FROM event_participation
               WHERE user_id = $1 AND event_id <> $5
           ))
      AND e.event_datetime < $3
      AND e.event_datetime + make_interval(
            mins => CASE WHEN m.duration_minutes > 0 THEN m.duration_minutes ELSE $4 END
          ) > $2
";

/// Half-open time span `[start, end)` a new commitment would occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: DateTimeWithTimeZone,
    pub end: DateTimeWithTimeZone,
}

/// Result of a hosting attempt that reached the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    Created(event::Model),
    /// The host already has a non-cancelled event in the slot.
    Conflict,
}

/// Result of a join attempt that reached the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
    /// No seat left, or the event stopped being scheduled.
    Full,
    /// The user hosts or joined another event in the slot.
    Conflict,
}

/// Public event row with movie and host.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct EventListing {
    pub event_id: i32,
    pub event_title: String,
    pub event_datetime: DateTimeWithTimeZone,
    pub status: String,
    pub description: Option<String>,
    pub max_participants: i32,
    pub current_participants: i32,
    pub movie_id: i32,
    pub movie_title: String,
    pub duration_minutes: Option<i32>,
    pub poster_image: Option<String>,
    pub host_id: Option<i32>,
    pub host_name: String,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct AdminEventListing {
    pub event_id: i32,
    pub event_title: String,
    pub event_datetime: DateTimeWithTimeZone,
    pub status: String,
    pub description: Option<String>,
    pub max_participants: i32,
    pub current_participants: i32,
    pub movie_id: i32,
    pub movie_title: String,
    pub host_name: String,
}

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Non-cancelled events, soonest first.
    pub async fn list_upcoming(&self) -> AppResult<Vec<EventListing>> {
        EventListing::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT e.event_id, e.event_title, e.event_datetime, e.status, e.description,
                   e.max_participants, e.current_participants,
                   m.movie_id, m.title AS movie_title, m.duration_minutes, m.poster_image,
                   e.host_id, COALESCE(u.name, 'Admin') AS host_name
            FROM events e
            JOIN movies m ON e.movie_id = m.movie_id
            LEFT JOIN users u ON e.host_id = u.user_id
            WHERE e.status <> 'cancelled'
            ORDER BY e.event_datetime ASC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Every event, latest first.
    pub async fn list_for_admin(&self) -> AppResult<Vec<AdminEventListing>> {
        AdminEventListing::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT e.event_id, e.event_title, e.event_datetime, e.status, e.description,
                   e.max_participants, e.current_participants,
                   m.movie_id, m.title AS movie_title,
                   COALESCE(u.name, 'Admin') AS host_name
            FROM events e
            JOIN movies m ON e.movie_id = m.movie_id
            LEFT JOIN users u ON e.host_id = u.user_id
            ORDER BY e.event_datetime DESC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Non-cancelled events hosted by a user.
    pub async fn hosted_active(&self, user_id: i32) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::HostId.eq(user_id))
            .filter(event::Column::Status.ne(EventStatus::Cancelled))
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Non-cancelled events a user hosts or has joined.
    pub async fn commitments(&self, user_id: i32) -> AppResult<Vec<event::Model>> {
        let joined = Query::select()
            .column(event_participation::Column::EventId)
            .from(EventParticipation)
            .and_where(event_participation::Column::UserId.eq(user_id))
            .to_owned();

        Event::find()
            .filter(event::Column::Status.ne(EventStatus::Cancelled))
            .filter(
                Condition::any()
                    .add(event::Column::HostId.eq(user_id))
                    .add(event::Column::EventId.in_subquery(joined)),
            )
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Whether a user has joined an event.
    pub async fn is_participant(&self, user_id: i32, event_id: i32) -> AppResult<bool> {
        let count = EventParticipation::find()
            .filter(event_participation::Column::UserId.eq(user_id))
            .filter(event_participation::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)?;
        Ok(count > 0)
    }

    /// Insert a member-hosted event unless it overlaps the host's others.
    ///
    /// The overlap scan and the insert run in one transaction holding the
    /// host's schedule lock, so concurrent requests by one user are serialized.
    pub async fn create_hosted(
        &self,
        host_id: i32,
        input: EventInput,
        slot: Slot,
    ) -> AppResult<HostOutcome> {
        let txn = self.db.begin().await.map_err(read_error)?;
        lock_schedule(&txn, host_id).await.map_err(write_error)?;

        if overlaps(&txn, HOSTED_OVERLAP_SQL, slot_values(host_id, slot))
            .await
            .map_err(read_error)?
        {
            txn.rollback().await.map_err(read_error)?;
            return Ok(HostOutcome::Conflict);
        }

        let created = new_event(Some(host_id), input)
            .insert(&txn)
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(HostOutcome::Created(created))
    }

    /// Insert a back-office event and write an audit row.
    pub async fn create_with_audit(
        &self,
        input: EventInput,
        audit: AuditEntry,
    ) -> AppResult<event::Model> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let created = new_event(None, input)
            .insert(&txn)
            .await
            .map_err(write_error)?;
        record(&txn, audit.on_record(created.event_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(created)
    }

    /// Edit title, movie, time and description, and write an audit row.
    ///
    /// Returns `false` when the event does not exist.
    pub async fn update_with_audit(
        &self,
        event_id: i32,
        input: EventInput,
        audit: AuditEntry,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Event::update_many()
            .col_expr(event::Column::EventTitle, Expr::value(input.title))
            .col_expr(event::Column::MovieId, Expr::value(input.movie_id))
            .col_expr(event::Column::EventDatetime, Expr::value(input.event_datetime))
            .col_expr(event::Column::Description, Expr::value(input.description))
            .filter(event::Column::EventId.eq(event_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(event_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }

    /// Cancel an event and write an audit row.
    ///
    /// Returns `false` when the event does not exist.
    pub async fn cancel_with_audit(&self, event_id: i32, audit: AuditEntry) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Event::update_many()
            .col_expr(event::Column::Status, Expr::value(EventStatus::Cancelled))
            .filter(event::Column::EventId.eq(event_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(event_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }

    /// Add a participant and take a seat, atomically.
    ///
    /// Holds the user's schedule lock while checking `slot` against their
    /// other commitments. The seat is only taken while the event is
    /// scheduled and below capacity; otherwise the participation row is
    /// rolled back too.
    pub async fn join(&self, user_id: i32, event_id: i32, slot: Slot) -> AppResult<JoinOutcome> {
        let txn = self.db.begin().await.map_err(read_error)?;
        lock_schedule(&txn, user_id).await.map_err(write_error)?;

        let mut values = slot_values(user_id, slot);
        values.push(event_id.into());
        if overlaps(&txn, COMMITTED_OVERLAP_SQL, values)
            .await
            .map_err(read_error)?
        {
            txn.rollback().await.map_err(read_error)?;
            return Ok(JoinOutcome::Conflict);
        }

        let inserted = event_participation::ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event_id),
            joined_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        if let Err(e) = inserted {
            let err = write_error(e);
            txn.rollback().await.map_err(read_error)?;
            return if err.is_conflict() {
                Ok(JoinOutcome::AlreadyJoined)
            } else {
                Err(err)
            };
        }

        let result = Event::update_many()
            .col_expr(
                event::Column::CurrentParticipants,
                Expr::col(event::Column::CurrentParticipants).add(1),
            )
            .filter(event::Column::EventId.eq(event_id))
            .filter(event::Column::Status.eq(EventStatus::Scheduled))
            .filter(
                Expr::col(event::Column::CurrentParticipants)
                    .lt(Expr::col(event::Column::MaxParticipants)),
            )
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(JoinOutcome::Full);
        }

        txn.commit().await.map_err(read_error)?;
        Ok(JoinOutcome::Joined)
    }

    /// Scheduled events whose start time has passed.
    pub async fn expired_scheduled(
        &self,
        now: DateTimeWithTimeZone,
    ) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::Status.eq(EventStatus::Scheduled))
            .filter(event::Column::EventDatetime.lt(now))
            .order_by_asc(event::Column::EventDatetime)
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Complete one event and mark its movie completed for every participant.
    ///
    /// Returns the number of participants, or `None` if the event was no
    /// longer scheduled.
    pub async fn conclude(&self, event: &event::Model) -> AppResult<Option<usize>> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Event::update_many()
            .col_expr(event::Column::Status, Expr::value(EventStatus::Completed))
            .filter(event::Column::EventId.eq(event.event_id))
            .filter(event::Column::Status.eq(EventStatus::Scheduled))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(None);
        }

        let participants = EventParticipation::find()
            .filter(event_participation::Column::EventId.eq(event.event_id))
            .all(&txn)
            .await
            .map_err(read_error)?;

        for participant in &participants {
            complete_in(&txn, participant.user_id, event.movie_id)
                .await
                .map_err(write_error)?;
        }

        txn.commit().await.map_err(read_error)?;
        Ok(Some(participants.len()))
    }
}

/// Serialize schedule changes of one user until the transaction ends.
async fn lock_schedule<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1, $2)",
        [SCHEDULE_LOCK_CLASS.into(), user_id.into()],
    ))
    .await?;
    Ok(())
}

fn slot_values(user_id: i32, slot: Slot) -> Vec<Value> {
    vec![
        user_id.into(),
        slot.start.into(),
        slot.end.into(),
        DEFAULT_DURATION_MINUTES.into(),
    ]
}

async fn overlaps<C: ConnectionTrait>(conn: &C, sql: &str, values: Vec<Value>) -> Result<bool, DbErr> {
    let row = conn
        .query_one(Statement::from_sql_and_values(DbBackend::Postgres, sql, values))
        .await?;

    let count: i64 = match row {
        Some(row) => row.try_get("", "num_items")?,
        None => 0,
    };
    Ok(count > 0)
}

fn new_event(host_id: Option<i32>, input: EventInput) -> event::ActiveModel {
    event::ActiveModel {
        host_id: Set(host_id),
        movie_id: Set(input.movie_id),
        event_title: Set(input.title),
        event_datetime: Set(input.event_datetime),
        description: Set(input.description),
        max_participants: Set(input.capacity.unwrap_or(DEFAULT_CAPACITY)),
        current_participants: Set(0),
        status: Set(EventStatus::Scheduled),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::watchlist;
    use chrono::Duration;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_event(id: i32, status: EventStatus) -> event::Model {
        event::Model {
            event_id: id,
            host_id: Some(1),
            movie_id: 7,
            event_title: "Friday night heist".to_string(),
            event_datetime: Utc::now().into(),
            description: None,
            max_participants: 2,
            current_participants: 0,
            status,
            created_at: Utc::now().into(),
        }
    }

    fn participation(user_id: i32, event_id: i32) -> event_participation::Model {
        event_participation::Model {
            participation_id: user_id,
            user_id,
            event_id,
            joined_at: Utc::now().into(),
        }
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn overlap_count(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn slot() -> Slot {
        let start = Utc::now() + Duration::days(1);
        Slot {
            start: start.into(),
            end: (start + Duration::minutes(120)).into(),
        }
    }

    fn input() -> EventInput {
        EventInput {
            title: "Friday night heist".to_string(),
            movie_id: 7,
            event_datetime: Utc::now().into(),
            description: None,
            capacity: None,
        }
    }

    #[tokio::test]
    async fn test_join_takes_a_seat() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // schedule lock
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(0)]])
                .append_query_results([[participation(4, 3)]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        assert_eq!(repo.join(4, 3, slot()).await.unwrap(), JoinOutcome::Joined);
    }

    #[tokio::test]
    async fn test_join_full_event_rolls_back() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(0)]])
                .append_query_results([[participation(4, 3)]])
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        assert_eq!(repo.join(4, 3, slot()).await.unwrap(), JoinOutcome::Full);
    }

    #[tokio::test]
    async fn test_join_overlap_found_under_lock() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(1)]])
                .into_connection(),
        );

        let repo = EventRepository::new(db.clone());
        assert_eq!(repo.join(4, 3, slot()).await.unwrap(), JoinOutcome::Conflict);
        drop(repo);

        let db = Arc::try_unwrap(db).unwrap_or_else(|_| panic!("connection still shared"));
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("pg_advisory_xact_lock"));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_create_hosted_defaults_capacity() {
        let mut event = create_test_event(3, EventStatus::Scheduled);
        event.max_participants = DEFAULT_CAPACITY;
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(0)]])
                .append_query_results([[event]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let outcome = repo.create_hosted(1, input(), slot()).await.unwrap();

        match outcome {
            HostOutcome::Created(created) => assert_eq!(created.max_participants, DEFAULT_CAPACITY),
            HostOutcome::Conflict => panic!("expected the event to be created"),
        }
    }

    #[tokio::test]
    async fn test_create_hosted_refuses_overlap() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(2)]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        assert_eq!(
            repo.create_hosted(1, input(), slot()).await.unwrap(),
            HostOutcome::Conflict
        );
    }

    #[tokio::test]
    async fn test_conclude_completes_participants() {
        let entry = watchlist::Model {
            watchlist_id: 1,
            user_id: 4,
            movie_id: 7,
            status: watchlist::WatchStatus::Completed,
            added_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // status update
                .append_exec_results([exec(1)])
                .append_query_results([[participation(4, 3)]])
                // participant had no watchlist row
                .append_query_results([Vec::<watchlist::Model>::new()])
                .append_query_results([[entry]])
                // history insert
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let event = create_test_event(3, EventStatus::Scheduled);

        assert_eq!(repo.conclude(&event).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_conclude_skips_already_completed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let event = create_test_event(3, EventStatus::Completed);

        assert_eq!(repo.conclude(&event).await.unwrap(), None);
    }
}
