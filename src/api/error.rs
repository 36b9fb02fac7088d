//! Mapping of errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::{LookupError, ParseError, ResolveError, StoreError};

/// Message returned for every server-side fault.
const INTERNAL_ERROR: &str = "internal server error";

/// Errors returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("invalid op")]
    InvalidOp,

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidOp | ApiError::Parse(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Resolve(ResolveError::InvalidFormat) => StatusCode::BAD_REQUEST,
            ApiError::Resolve(ResolveError::DomainNotAllowed) => StatusCode::FORBIDDEN,
            ApiError::Lookup(LookupError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Lookup(_) | ApiError::Store(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server faults never leak their detail
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            INTERNAL_ERROR.to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
