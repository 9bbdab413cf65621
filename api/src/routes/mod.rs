pub mod capabilities;
pub mod health;
pub mod recommend;

use axum::http::HeaderMap;

/// `X-Request-Id` of the incoming request, or `-`.
pub(crate) fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
