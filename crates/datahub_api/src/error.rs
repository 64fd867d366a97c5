//! HTTP error mapping.
//!
//! # Invariants
//! - `NotFound` (dispatcher or route) maps to 404; everything else to 400.
//! - Error bodies are always `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use datahub_core::DispatchError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    Dispatch(DispatchError),
    /// Request body is not a flat JSON object.
    MalformedBody(String),
    /// Path segment that cannot name a row (e.g. non-integer id).
    NoSuchResource(String),
    /// Shared store session is unusable (poisoned lock).
    StoreUnavailable,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Dispatch(DispatchError::NotFound { .. }) | Self::NoSuchResource(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispatch(err) => write!(f, "{err}"),
            Self::MalformedBody(message) => write!(f, "malformed request body: {message}"),
            Self::NoSuchResource(path) => write!(f, "resource not found: {path}"),
            Self::StoreUnavailable => write!(f, "store session unavailable"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
