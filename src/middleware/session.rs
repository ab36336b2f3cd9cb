//! Session cookie middleware: resolves (or mints) the server-side session
//! for every API request and exposes it to handlers through request
//! extensions.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::sessions::SESSION_COOKIE;
use crate::state::AppState;

pub async fn attach(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let cookie_id = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_session_cookie);

    let (session, created) = state.sessions.get_or_create(cookie_id);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if created {
        // Session cookie: no Max-Age, so it lives for the browser session.
        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            session.id
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to build session cookie header");
            }
        }
    }

    response
}

fn parse_session_cookie(header: &str) -> Option<Uuid> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_cookie_among_others() {
        let id = Uuid::new_v4();
        let header = format!("theme=dark; {SESSION_COOKIE}={id}; lang=fr");
        assert_eq!(parse_session_cookie(&header), Some(id));
    }

    #[test]
    fn ignores_malformed_cookie_values() {
        assert_eq!(parse_session_cookie("garage_sid=not-a-uuid"), None);
        assert_eq!(parse_session_cookie("other=1"), None);
    }
}
