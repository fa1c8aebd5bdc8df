//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use reelhouse_common::{AppResult, IdGenerator};
use reelhouse_core::{LoginInput, Principal, SignupInput};
use serde::Serialize;
use tracing::info;

use crate::{
    extractors::MaybeSession,
    middleware::{AppState, CookieSettings},
    response::{LoginResponse, Success, success},
};

/// Where anonymous visitors of `/` are sent.
const PUBLIC_LANDING: &str = "/main.html";

/// Create auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/check-auth", get(check_auth))
        .route("/logout", post(logout))
}

fn session_cookie(settings: &CookieSettings, id: String) -> Cookie<'static> {
    Cookie::build((settings.name.clone(), id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .build()
}

/// Log in and start a fresh session.
async fn login(
    State(state): State<AppState>,
    MaybeSession(existing): MaybeSession,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let principal = state.auth_service.login(input).await?;

    if let Some(previous) = existing {
        state.sessions.destroy(&previous.id).await?;
    }

    let id = IdGenerator::new().generate_token();
    state.sessions.save(&id, &principal).await?;

    info!(principal_id = principal.id, role = ?principal.role, "Logged in");

    let jar = jar.add(session_cookie(&state.cookie, id));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            redirect: principal.role.landing_page(),
        }),
    ))
}

/// Create a member account, or a moderator when a super admin asks.
async fn signup(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(input): Json<SignupInput>,
) -> AppResult<Json<Success>> {
    let caller = session.as_ref().map(|ctx| &ctx.principal);
    state.auth_service.signup(input, caller).await?;
    Ok(success())
}

#[derive(Debug, Serialize)]
struct AuthStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Principal>,
}

async fn check_auth(MaybeSession(session): MaybeSession) -> Json<AuthStatus> {
    let user = session.map(|ctx| ctx.principal);
    Json(AuthStatus {
        authenticated: user.is_some(),
        user,
    })
}

async fn logout(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Success>)> {
    if let Some(ctx) = session {
        state.sessions.destroy(&ctx.id).await?;
        info!(principal_id = ctx.principal.id, "Logged out");
    }

    let jar = jar.remove(Cookie::build(state.cookie.name.clone()).path("/"));
    Ok((jar, success()))
}

/// `GET /`: send the visitor to the page for their role.
pub async fn landing(MaybeSession(session): MaybeSession) -> Redirect {
    let target = session.map_or(PUBLIC_LANDING, |ctx| ctx.principal.role.landing_page());
    Redirect::to(target)
}
