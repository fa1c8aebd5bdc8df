//! Application state and the session middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use reelhouse_common::config::SessionConfig;
use reelhouse_core::{
    AdminService, AuthService, CatalogService, DashboardService, EventService, FriendService,
    MessagingService, ModerationService, NotificationService, PostService, Principal,
    ReviewService, WatchlistService,
};
use reelhouse_db::repositories::{
    AdminRepository, AuditRepository, CommentRepository, EventRepository, FriendRepository,
    MessageRepository, MovieRepository, NotificationRepository, PostRepository, ReportRepository,
    RestrictedWordRepository, ReviewRepository, UserRepository, WatchlistRepository,
};
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::session::SessionStore;

/// Cookie attributes shared by login and logout.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

impl From<&SessionConfig> for CookieSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookie,
        }
    }
}

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub post_service: PostService,
    pub event_service: EventService,
    pub watchlist_service: WatchlistService,
    pub review_service: ReviewService,
    pub friend_service: FriendService,
    pub messaging_service: MessagingService,
    pub notification_service: NotificationService,
    pub dashboard_service: DashboardService,
    pub moderation_service: ModerationService,
    pub admin_service: AdminService,
    pub sessions: Arc<dyn SessionStore>,
    pub cookie: CookieSettings,
}

impl AppState {
    /// Wire every repository and service onto one connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        sessions: Arc<dyn SessionStore>,
        session_config: &SessionConfig,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let admin_repo = AdminRepository::new(Arc::clone(&db));
        let movie_repo = MovieRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let word_repo = RestrictedWordRepository::new(Arc::clone(&db));
        let event_repo = EventRepository::new(Arc::clone(&db));
        let watchlist_repo = WatchlistRepository::new(Arc::clone(&db));
        let review_repo = ReviewRepository::new(Arc::clone(&db));
        let friend_repo = FriendRepository::new(Arc::clone(&db));
        let message_repo = MessageRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));
        let audit_repo = AuditRepository::new(Arc::clone(&db));
        let report_repo = ReportRepository::new(db);

        let notification_service = NotificationService::new(notification_repo);

        Self {
            auth_service: AuthService::new(user_repo.clone(), admin_repo),
            catalog_service: CatalogService::new(movie_repo.clone()),
            post_service: PostService::new(
                post_repo.clone(),
                comment_repo.clone(),
                word_repo.clone(),
                movie_repo.clone(),
                notification_service.clone(),
            ),
            event_service: EventService::new(
                event_repo,
                movie_repo.clone(),
                notification_service.clone(),
            ),
            watchlist_service: WatchlistService::new(watchlist_repo.clone(), movie_repo.clone()),
            review_service: ReviewService::new(review_repo.clone(), movie_repo),
            friend_service: FriendService::new(
                friend_repo.clone(),
                user_repo.clone(),
                post_repo.clone(),
                notification_service.clone(),
            ),
            messaging_service: MessagingService::new(
                message_repo.clone(),
                friend_repo.clone(),
                notification_service.clone(),
            ),
            dashboard_service: DashboardService::new(
                user_repo.clone(),
                watchlist_repo,
                review_repo,
                friend_repo,
                post_repo.clone(),
                message_repo,
            ),
            moderation_service: ModerationService::new(
                post_repo.clone(),
                comment_repo.clone(),
                word_repo,
            ),
            admin_service: AdminService::new(
                user_repo,
                post_repo,
                comment_repo,
                audit_repo,
                report_repo,
            ),
            notification_service,
            sessions,
            cookie: CookieSettings::from(session_config),
        }
    }
}

/// The session a request arrived with.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: String,
    pub principal: Principal,
}

/// Resolve the session cookie into a [`SessionContext`] request extension.
///
/// A store failure is logged and the request proceeds unauthenticated.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    if let Some(cookie) = jar.get(&state.cookie.name) {
        let id = cookie.value().to_string();
        match state.sessions.load(&id).await {
            Ok(Some(principal)) => {
                req.extensions_mut()
                    .insert(SessionContext { id, principal });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load session"),
        }
    }

    next.run(req).await
}
