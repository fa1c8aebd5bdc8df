//! Request extractors.
//!
//! Guards read the [`SessionContext`] placed by the session middleware and
//! reject with an [`AppError`] before the handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use reelhouse_common::AppError;
use reelhouse_core::Principal;

use crate::middleware::SessionContext;

fn session(parts: &Parts) -> Option<SessionContext> {
    parts.extensions.get::<SessionContext>().cloned()
}

/// Any logged-in principal.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session(parts)
            .map(|ctx| Self(ctx.principal))
            .ok_or(AppError::Unauthorized)
    }
}

/// A community member backed by a `users` row.
#[derive(Debug, Clone)]
pub struct MemberUser(pub Principal);

impl<S> FromRequestParts<S> for MemberUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = session(parts).ok_or(AppError::Unauthorized)?;
        if ctx.principal.is_member() {
            Ok(Self(ctx.principal))
        } else {
            Err(AppError::Forbidden("Forbidden".to_string()))
        }
    }
}

/// A content moderator or super admin.
#[derive(Debug, Clone)]
pub struct StaffUser(pub Principal);

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = session(parts).ok_or(AppError::Unauthorized)?;
        if ctx.principal.is_staff() {
            Ok(Self(ctx.principal))
        } else {
            Err(AppError::Forbidden("Forbidden".to_string()))
        }
    }
}

/// The session, when there is one.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionContext>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session(parts)))
    }
}
