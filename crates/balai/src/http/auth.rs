//! HTTP Basic Authentication gate for the admin panel.
//!
//! Every request to `/admin` or below must carry the configured credentials.
//! There are no sessions: each request authenticates on its own.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use super::AppState;
use crate::config::AdminCredentials;

/// Realm announced in the `WWW-Authenticate` challenge.
pub const REALM: &str = "Admin";

/// Whether `path` is covered by the admin gate.
#[must_use]
pub fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// Decode an `Authorization: Basic ...` header value into username and
/// password.
#[must_use]
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Check a supplied username/password pair against the expected credentials.
#[must_use]
pub fn credentials_match(expected: &AdminCredentials, username: &str, password: &str) -> bool {
    // Both comparisons always run so timing does not reveal which one failed.
    let user_ok = constant_time_eq(expected.username.as_bytes(), username.as_bytes());
    let pass_ok = constant_time_eq(expected.password.as_bytes(), password.as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(expected: &[u8], supplied: &[u8]) -> bool {
    let mut diff = u8::from(expected.len() != supplied.len());
    for (i, byte) in supplied.iter().enumerate() {
        let other = expected.get(i).copied().unwrap_or(0);
        diff |= byte ^ other;
    }
    diff == 0
}

fn supplied_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth)
}

/// Reject unauthenticated requests to admin paths with a Basic challenge.
pub(crate) async fn admin_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_admin_path(request.uri().path()) {
        return next.run(request).await;
    }

    match supplied_credentials(request.headers()) {
        Some((username, password)) if credentials_match(&state.credentials, &username, &password) => {
            next.run(request).await
        }
        Some((username, _)) => {
            warn!(username = %username, "Rejected admin credentials");
            challenge()
        }
        None => challenge(),
    }
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
        "Unauthorized",
    )
        .into_response()
}
