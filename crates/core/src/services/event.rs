//! Watch events: hosting, joining, conclusion and the back-office calendar.

use std::collections::HashMap;

use chrono::Utc;
use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::{
        audit_log::AuditTarget,
        event::{self, EventStatus},
        movie,
    },
    repositories::{
        AdminEventListing, AuditAction, AuditEntry, EventInput, EventListing, EventRepository,
        HostOutcome, JoinOutcome, MovieRepository, Slot,
    },
};
use serde::Deserialize;
use tracing::{error, info};

use super::notification::NotificationService;
use crate::principal::Principal;
use crate::schedule::{Window, find_conflict, parse_event_datetime};

const HOST_CONFLICT: &str =
    "Scheduling Conflict: You already have an event scheduled during this time window.";
const JOIN_CONFLICT: &str =
    "Scheduling Conflict: You are already joined/hosting another event at this time.";
const ALREADY_JOINED: &str = "You have already joined this event.";
const EVENT_FULL: &str = "Event is full.";

/// Event form shared by members and the back office.
#[derive(Debug, Default, Deserialize)]
pub struct EventForm {
    /// Only read on back-office edits.
    pub event_id: Option<i32>,
    #[serde(default)]
    pub title: String,
    pub movie_id: Option<i32>,
    #[serde(default)]
    pub event_datetime: String,
    pub description: Option<String>,
    pub capacity: Option<i32>,
}

impl EventForm {
    fn require_fields(&self) -> AppResult<i32> {
        match self.movie_id {
            Some(movie_id) if !self.title.trim().is_empty() && !self.event_datetime.is_empty() => {
                Ok(movie_id)
            }
            _ => Err(AppError::BadRequest("Missing required fields".to_string())),
        }
    }
}

/// Event service.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    movie_repo: MovieRepository,
    notifications: NotificationService,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(
        event_repo: EventRepository,
        movie_repo: MovieRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            event_repo,
            movie_repo,
            notifications,
        }
    }

    /// Events that are not cancelled, soonest first.
    pub async fn list(&self) -> AppResult<Vec<EventListing>> {
        self.event_repo.list_upcoming().await
    }

    /// Host an event, refusing one that overlaps the host's other events.
    ///
    /// The scan here gives the early answer; the repository repeats it under
    /// the host's schedule lock before inserting.
    pub async fn host_event(&self, host: &Principal, form: EventForm) -> AppResult<event::Model> {
        let movie_id = form.require_fields()?;
        if form.capacity.is_some_and(|c| c < 1) {
            return Err(AppError::BadRequest(
                "Capacity must be at least 1".to_string(),
            ));
        }

        let movie = self
            .movie_repo
            .find_by_id(movie_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid movie".to_string()))?;
        let start = parse_event_datetime(&form.event_datetime)?;
        let candidate = Window::new(start, movie.effective_duration());

        let hosted = self.event_repo.hosted_active(host.id).await?;
        if find_conflict(&candidate, self.windows(&hosted).await?).is_some() {
            return Err(AppError::BadRequest(HOST_CONFLICT.to_string()));
        }

        let outcome = self
            .event_repo
            .create_hosted(
                host.id,
                EventInput {
                    title: form.title,
                    movie_id,
                    event_datetime: start.into(),
                    description: form.description,
                    capacity: form.capacity,
                },
                slot(candidate),
            )
            .await?;
        let created = match outcome {
            HostOutcome::Created(created) => created,
            HostOutcome::Conflict => return Err(AppError::BadRequest(HOST_CONFLICT.to_string())),
        };

        info!(event_id = created.event_id, host_id = host.id, "Event hosted");
        Ok(created)
    }

    /// Join an event.
    ///
    /// The checks here give the precise error; the repository guards the
    /// seat count and the user's schedule again under concurrency.
    pub async fn join_event(&self, user: &Principal, event_id: i32) -> AppResult<()> {
        let event = self
            .event_repo
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if event.status != EventStatus::Scheduled {
            return Err(AppError::BadRequest(
                "This event is not open for joining.".to_string(),
            ));
        }
        if !event.has_room() {
            return Err(AppError::BadRequest(EVENT_FULL.to_string()));
        }
        if self.event_repo.is_participant(user.id, event_id).await? {
            return Err(AppError::BadRequest(ALREADY_JOINED.to_string()));
        }

        let duration = self
            .movie_repo
            .find_by_id(event.movie_id)
            .await?
            .map_or_else(|| movie::effective_duration(None), |m| m.effective_duration());
        let candidate = Window::new(event.event_datetime.to_utc(), duration);

        let commitments = self.event_repo.commitments(user.id).await?;
        if find_conflict(&candidate, self.windows(&commitments).await?).is_some() {
            return Err(AppError::BadRequest(JOIN_CONFLICT.to_string()));
        }

        match self.event_repo.join(user.id, event_id, slot(candidate)).await? {
            JoinOutcome::Joined => {}
            JoinOutcome::AlreadyJoined => {
                return Err(AppError::BadRequest(ALREADY_JOINED.to_string()));
            }
            JoinOutcome::Full => return Err(AppError::BadRequest(EVENT_FULL.to_string())),
            JoinOutcome::Conflict => {
                return Err(AppError::BadRequest(JOIN_CONFLICT.to_string()));
            }
        }

        info!(event_id, user_id = user.id, "Joined event");
        if let Some(host_id) = event.host_id {
            self.notifications
                .event_joined(host_id, user, event_id, &event.event_title)
                .await;
        }
        Ok(())
    }

    /// Complete every scheduled event whose start has passed.
    ///
    /// Each event is concluded in its own transaction; a failure is logged
    /// and the sweep moves on. Returns how many events were concluded.
    pub async fn conclude_expired(&self) -> AppResult<usize> {
        let expired = self.event_repo.expired_scheduled(Utc::now().into()).await?;
        let mut concluded = 0;

        for event in &expired {
            match self.event_repo.conclude(event).await {
                Ok(Some(participants)) => {
                    concluded += 1;
                    info!(event_id = event.event_id, participants, "Event concluded");
                }
                Ok(None) => {}
                Err(e) => error!(event_id = event.event_id, error = %e, "Failed to conclude event"),
            }
        }

        Ok(concluded)
    }

    // ========== Back office ==========

    /// Every event, newest first.
    pub async fn admin_list(&self) -> AppResult<Vec<AdminEventListing>> {
        self.event_repo.list_for_admin().await
    }

    /// Create an event with no member host.
    pub async fn admin_create(&self, admin: &Principal, form: EventForm) -> AppResult<event::Model> {
        let input = self.admin_input(form).await?;
        let audit = AuditEntry::new(
            admin.id,
            AuditAction::Insert,
            AuditTarget::Events,
            format!("Created event: {}", input.title),
        );

        self.event_repo.create_with_audit(input, audit).await
    }

    /// Edit an event's title, movie, start and description.
    pub async fn admin_update(&self, admin: &Principal, form: EventForm) -> AppResult<()> {
        let event_id = form
            .event_id
            .ok_or_else(|| AppError::BadRequest("Missing event id".to_string()))?;
        let input = self.admin_input(form).await?;
        let audit = AuditEntry::new(
            admin.id,
            AuditAction::Update,
            AuditTarget::Events,
            format!("Updated event: {}", input.title),
        );

        if self.event_repo.update_with_audit(event_id, input, audit).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Event not found".to_string()))
        }
    }

    /// Cancel an event from the back office. Participants keep their rows.
    pub async fn admin_cancel(&self, admin: &Principal, event_id: i32) -> AppResult<()> {
        let audit = AuditEntry::new(
            admin.id,
            AuditAction::Update,
            AuditTarget::Events,
            "Cancelled event",
        );

        if self.event_repo.cancel_with_audit(event_id, audit).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Event not found".to_string()))
        }
    }

    async fn admin_input(&self, form: EventForm) -> AppResult<EventInput> {
        let movie_id = form.require_fields()?;
        if self.movie_repo.find_by_id(movie_id).await?.is_none() {
            return Err(AppError::BadRequest("Invalid movie".to_string()));
        }

        Ok(EventInput {
            title: form.title,
            movie_id,
            event_datetime: parse_event_datetime(&form.event_datetime)?.into(),
            description: form.description,
            capacity: form.capacity,
        })
    }

    /// Time windows of `events`, using each movie's runtime.
    async fn windows(&self, events: &[event::Model]) -> AppResult<Vec<Window>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let movie_ids: Vec<i32> = events.iter().map(|e| e.movie_id).collect();
        let durations: HashMap<i32, i32> = self
            .movie_repo
            .find_by_ids(&movie_ids)
            .await?
            .into_iter()
            .map(|m| (m.movie_id, m.effective_duration()))
            .collect();

        Ok(events
            .iter()
            .map(|e| {
                let minutes = durations
                    .get(&e.movie_id)
                    .copied()
                    .unwrap_or_else(|| movie::effective_duration(None));
                Window::new(e.event_datetime.to_utc(), minutes)
            })
            .collect())
    }
}

fn slot(window: Window) -> Slot {
    Slot {
        start: window.start.into(),
        end: window.end.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use chrono::{DateTime, TimeZone};
    use maplit::btreemap;
    use reelhouse_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn member(id: i32) -> Principal {
        Principal {
            id,
            name: "Rosa".to_string(),
            role: Role::User,
            email: "rosa@example.com".to_string(),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, h, m, 0).unwrap()
    }

    fn test_movie(id: i32, minutes: Option<i32>) -> movie::Model {
        movie::Model {
            movie_id: id,
            title: "Heat".to_string(),
            release_year: Some(1995),
            duration_minutes: minutes,
            synopsis: None,
            poster_image: None,
            created_by: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_event(id: i32, host: Option<i32>, start: DateTime<Utc>) -> event::Model {
        event::Model {
            event_id: id,
            host_id: host,
            movie_id: 1,
            event_title: "Movie night".to_string(),
            event_datetime: start.into(),
            description: None,
            max_participants: 20,
            current_participants: 0,
            status: EventStatus::Scheduled,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> EventService {
        let db = Arc::new(db.into_connection());
        EventService::new(
            EventRepository::new(db.clone()),
            MovieRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
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

    fn form(datetime: &str) -> EventForm {
        EventForm {
            title: "Late show".to_string(),
            movie_id: Some(1),
            event_datetime: datetime.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_host_conflict() {
        // Hosted 18:00 for 90 minutes; new event at 19:00.
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie(1, Some(60))]])
                .append_query_results([[test_event(1, Some(9), at(18, 0))]])
                .append_query_results([[test_movie(1, Some(90))]]),
        );

        let err = events
            .host_event(&member(9), form("2030-05-01T19:00"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), HOST_CONFLICT);
    }

    #[tokio::test]
    async fn test_host_unknown_movie() {
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<movie::Model>::new()]),
        );

        let err = events
            .host_event(&member(9), form("2030-05-01T19:00"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid movie");
    }

    #[tokio::test]
    async fn test_host_after_previous_event_ends() {
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie(1, Some(60))]])
                .append_query_results([[test_event(1, Some(9), at(18, 0))]])
                .append_query_results([[test_movie(1, Some(90))]])
                // schedule lock, then the locked overlap scan and the insert
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(0)]])
                .append_query_results([[test_event(2, Some(9), at(19, 30))]]),
        );

        let created = events
            .host_event(&member(9), form("2030-05-01 19:30"))
            .await
            .unwrap();

        assert_eq!(created.event_id, 2);
    }

    #[tokio::test]
    async fn test_host_conflict_found_under_lock() {
        // A concurrent request stored an overlapping event after the early scan.
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie(1, Some(60))]])
                .append_query_results([Vec::<event::Model>::new()])
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(1)]]),
        );

        let err = events
            .host_event(&member(9), form("2030-05-01T19:00"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), HOST_CONFLICT);
    }

    #[tokio::test]
    async fn test_join_conflict_found_under_lock() {
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event(4, Some(2), at(20, 0))]])
                .append_query_results([[btreemap! {
                    "num_items" => Value::BigInt(Some(0)),
                }]])
                .append_query_results([[test_movie(1, Some(120))]])
                .append_query_results([Vec::<event::Model>::new()])
                .append_exec_results([exec(1)])
                .append_query_results([[overlap_count(1)]]),
        );

        let err = events.join_event(&member(9), 4).await.unwrap_err();
        assert_eq!(err.to_string(), JOIN_CONFLICT);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let events = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = events
            .host_event(&member(9), EventForm::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[tokio::test]
    async fn test_join_cancelled_event() {
        let mut cancelled = test_event(4, Some(2), at(20, 0));
        cancelled.status = EventStatus::Cancelled;
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[cancelled]]),
        );

        let err = events.join_event(&member(9), 4).await.unwrap_err();
        assert_eq!(err.to_string(), "This event is not open for joining.");
    }

    #[tokio::test]
    async fn test_join_full_event() {
        let mut full = test_event(4, Some(2), at(20, 0));
        full.current_participants = 20;
        let events =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[full]]));

        let err = events.join_event(&member(9), 4).await.unwrap_err();
        assert_eq!(err.to_string(), EVENT_FULL);
    }

    #[tokio::test]
    async fn test_join_overlapping_commitment() {
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event(4, Some(2), at(20, 0))]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .append_query_results([[test_movie(1, Some(120))]])
                .append_query_results([[test_event(7, Some(9), at(21, 0))]])
                .append_query_results([[test_movie(1, Some(120))]]),
        );

        let err = events.join_event(&member(9), 4).await.unwrap_err();
        assert_eq!(err.to_string(), JOIN_CONFLICT);
    }

    #[tokio::test]
    async fn test_join_twice() {
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event(4, Some(2), at(20, 0))]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]]),
        );

        let err = events.join_event(&member(9), 4).await.unwrap_err();
        assert_eq!(err.to_string(), ALREADY_JOINED);
    }

    #[tokio::test]
    async fn test_conclude_with_nothing_expired() {
        let events = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event::Model>::new()]),
        );

        assert_eq!(events.conclude_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_admin_cancel_missing_event() {
        let events = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            sea_orm::MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));
        let admin = Principal {
            id: 1,
            name: "mod".to_string(),
            role: Role::ContentModerator,
            email: "mod@example.com".to_string(),
        };

        let err = events.admin_cancel(&admin, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
