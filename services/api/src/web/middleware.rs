//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use caption_genius_core::PortError;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::web::state::{AppState, SessionContext};

/// Reads the session id from the `session` cookie, falling back to a bearer token.
fn session_id(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .find_map(|c| c.trim().strip_prefix("session="))
        });

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session and attaches a `SessionContext`.
///
/// If valid, inserts the context into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized. Store faults propagate as 500.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the session id
    let auth_session_id = session_id(req.headers())
        .ok_or(ApiError::Unauthenticated)?
        .to_string();

    // 2. Validate auth session in database, get user_id
    let user_id = state
        .db
        .validate_auth_session(&auth_session_id)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized | PortError::NotFound(_) => {
                warn!("Rejected auth session: {:?}", e);
                ApiError::Unauthenticated
            }
            // Store faults are server errors, not rejected sessions.
            other => ApiError::Port(other),
        })?;
    debug!(%user_id, "Session validated");

    // 3. Insert the session context into request extensions
    req.extensions_mut().insert(SessionContext { user_id });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=abc123"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_id(&headers), Some("abc123"));
    }

    #[test]
    fn bearer_token_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_id(&headers), Some("xyz"));
    }

    #[test]
    fn empty_session_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_id(&headers), None);
    }
}
