//! Request bodies for the form handlers.
//!
//! The site's own pages post urlencoded forms; scripts may post JSON with the
//! same field names. A body that is missing, of another type, or malformed
//! decodes to the form's default value, which the handlers then reject as
//! incomplete.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderMap};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use tracing::debug;

/// How a request body is encoded, judged by its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `application/json` or any `+json` type
    Json,
    /// Missing or anything else.
    Other,
}

/// Classify the request body.
#[must_use]
pub fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Other;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
        "application/json" => BodyKind::Json,
        m if m.starts_with("application/") && m.ends_with("+json") => BodyKind::Json,
        _ => BodyKind::Other,
    }
}

/// A form payload decoded from a urlencoded or JSON body.
#[derive(Debug, Clone, Default)]
pub struct Submission<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Submission<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let decoded = match body_kind(req.headers()) {
            BodyKind::UrlEncoded => Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|rejection| rejection.body_text()),
            BodyKind::Json => Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| value)
                .map_err(|rejection| rejection.body_text()),
            BodyKind::Other => Err("missing or unsupported content type".to_string()),
        };

        Ok(Self(decoded.unwrap_or_else(|reason| {
            debug!(reason = %reason, "Form body not decoded, treating it as empty");
            T::default()
        })))
    }
}
