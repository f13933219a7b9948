//! Admin token check for settings writes
//!
//! With no token configured the check is disabled and writes pass through.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// Constant-time comparison of two tokens
fn tokens_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len() && constant_time_eq(given.as_bytes(), expected.as_bytes())
}

/// Middleware rejecting requests without the configured admin token
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        debug!("Admin authentication disabled (no admin token configured)");
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .is_some_and(|token| tokens_match(token, expected));

    if !authorized {
        warn!("Rejected settings write to {}: bad or missing admin token", request.uri().path());
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}
