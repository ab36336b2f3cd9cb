//! Handler-side session extractors. [`ClientSession`] yields the current
//! session for public routes; [`AdminSession`] additionally requires the
//! admin flag set by a successful login and rejects with 401 otherwise.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::sessions::Session;

#[derive(Clone)]
pub struct ClientSession(pub Arc<Session>);

impl<S> FromRequestParts<S> for ClientSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<Session>>()
            .cloned()
            .map(ClientSession)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("session middleware is not installed"))
            })
    }
}

/// The admin gate: a boolean flag on the session, checked on every admin
/// route.
#[derive(Clone)]
pub struct AdminSession(pub Arc<Session>);

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AdminSession").field(&self.0.id).finish()
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ClientSession(session) = ClientSession::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            return Err(AppError::Unauthorized);
        }
        Ok(AdminSession(session))
    }
}
