use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ApiError, INVALID_CREDENTIALS, NOT_AUTHENTICATED};
use crate::state::AppState;

/// HTTP Basic authentication middleware.
///
/// Runs before any extractor of the protected route, so a request with
/// wrong or missing credentials is rejected even if its parameters are
/// invalid too.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some((username, password)) = basic_credentials(req.headers()) else {
        tracing::warn!(path = %req.uri().path(), "request without basic credentials");
        return Err(ApiError::Unauthorized(NOT_AUTHENTICATED));
    };

    if !state.credentials.matches(&username, &password) {
        tracing::warn!(%username, path = %req.uri().path(), "rejected basic credentials");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    Ok(next.run(req).await)
}

/// Decodes `Authorization: Basic <base64(username:password)>`.
///
/// The password is everything after the first colon, so it may itself
/// contain colons.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
