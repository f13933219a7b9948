//! Error types for marquee-web handlers

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::overlay::escape_html;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong admin token (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// marquee-common error
    #[error(transparent)]
    Common(#[from] marquee_common::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Common(marquee_common::Error::MovieNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(marquee_common::Error::InvalidCatalogEntry(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error rendered as an HTML page, for browser-facing routes
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        PageError(err)
    }
}

impl From<marquee_common::Error> for PageError {
    fn from(err: marquee_common::Error) -> Self {
        PageError(ApiError::Common(err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            error!("Page failed: {}", self.0);
        }

        let title = status.canonical_reason().unwrap_or("Error");
        let html = format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\"><title>{title}</title></head>\
             <body><h1>{title}</h1><p>{message}</p><p><a href=\"/\">Back to catalog</a></p></body></html>",
            title = title,
            message = escape_html(&self.0.to_string()),
        );
        (status, Html(html)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_status() {
        let not_found = ApiError::from(marquee_common::Error::MovieNotFound("heat".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(marquee_common::Error::InvalidCatalogEntry("slug".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let store = ApiError::from(marquee_common::Error::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_page_error_keeps_status() {
        let response = PageError::from(marquee_common::Error::MovieNotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
    }
}
