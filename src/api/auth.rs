//! Token authentication for write endpoints.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::{error::ApiError, AppState};

/// Reject requests whose `Authorization` header does not carry a
/// configured API key. Both `Bearer <key>` and a bare `<key>` are accepted.
pub async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(bearer_token)
        .is_some_and(|token| state.is_api_key(token));

    if !authorized {
        warn!(path = %request.uri().path(), "rejected request without valid token");
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Strip an optional `Bearer ` scheme from a header value.
fn bearer_token(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => value,
    }
}
