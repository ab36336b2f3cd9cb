use argon2::{Argon2, password_hash::{PasswordHash, PasswordVerifier}};
use serde_json::json;

use crate::{
    audit,
    dto::admin::Dashboard,
    dto::auth::{LoginRequest, SessionInfo},
    error::{AppError, AppResult},
    models::{Command, Reservation, decode_or_skip},
    response::{ApiResponse, Meta},
    sessions::Session,
    state::AppState,
    store::Collection,
};

const DASHBOARD_RECENT: usize = 5;

/// Verifies the admin password and flips the session's admin flag. With
/// no hash configured, login is disabled outright.
pub fn login(
    state: &AppState,
    session: &Session,
    payload: LoginRequest,
) -> AppResult<ApiResponse<SessionInfo>> {
    let Some(hash) = state.config.admin_password_hash.as_deref() else {
        tracing::warn!("admin login attempted but no password is configured");
        return Err(AppError::Unauthorized);
    };
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bad admin hash: {e}")))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .is_err()
    {
        tracing::warn!(session = %session.id, "admin login failed");
        return Err(AppError::Unauthorized);
    }

    session.set_admin(true);
    audit::record(session.id, "admin_login", "session", json!({}));
    Ok(ApiResponse::success(
        "Logged in",
        SessionInfo { admin: true },
        Some(Meta::empty()),
    ))
}

pub fn logout(session: &Session) -> ApiResponse<SessionInfo> {
    session.set_admin(false);
    audit::record(session.id, "admin_logout", "session", json!({}));
    ApiResponse::success("Logged out", SessionInfo { admin: false }, Some(Meta::empty()))
}

pub fn session_info(session: &Session) -> ApiResponse<SessionInfo> {
    ApiResponse::success(
        "Session",
        SessionInfo {
            admin: session.is_admin(),
        },
        Some(Meta::empty()),
    )
}

/// Landing page payload: per-collection counts plus the latest commands
/// and reservations.
pub async fn dashboard(state: &AppState) -> AppResult<ApiResponse<Dashboard>> {
    let products = state.store.list(Collection::Products).await?.len();
    let command_docs = state.store.list(Collection::Commands).await?;
    let reservation_docs = state.store.list(Collection::Reservations).await?;
    let messages = state.store.list(Collection::ContactMessages).await?.len();

    let mut recent_commands: Vec<Command> =
        command_docs.iter().filter_map(decode_or_skip).collect();
    recent_commands.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_commands.truncate(DASHBOARD_RECENT);

    let mut recent_reservations: Vec<Reservation> =
        reservation_docs.iter().filter_map(decode_or_skip).collect();
    recent_reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_reservations.truncate(DASHBOARD_RECENT);

    let data = Dashboard {
        products,
        commands: command_docs.len(),
        reservations: reservation_docs.len(),
        messages,
        recent_commands,
        recent_reservations,
    };
    Ok(ApiResponse::success("Dashboard", data, Some(Meta::empty())))
}
