//! HTTP layer for reelhouse.
//!
//! - **Endpoints**: the JSON API under `/api` plus the `/` landing redirect
//! - **Sessions**: cookie-keyed [`SessionStore`] in memory or Redis
//! - **Extractors**: [`CurrentUser`], [`MemberUser`] and [`StaffUser`] guards
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod session;

use axum::{Router, middleware::from_fn_with_state, routing::get};

pub use endpoints::router;
pub use extractors::{CurrentUser, MaybeSession, MemberUser, StaffUser};
pub use middleware::{AppState, SessionContext};
pub use session::{MemorySessionStore, RedisSessionStore, SessionStore};

/// The full application router: landing redirect, `/api` and the session
/// middleware in front of both.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(endpoints::landing))
        .nest("/api", router())
        .layer(from_fn_with_state(state.clone(), middleware::session_middleware))
        .with_state(state)
}
