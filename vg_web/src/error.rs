//! ABOUTME: Maps core errors onto HTTP status codes and JSON bodies
//! ABOUTME: Gives handlers a single error type usable with the ? operator

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use validator::ValidationErrors;

use crate::models::ErrorResponse;

/// API error carrying the response body and status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::new("validation_error", message),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse::new("not_found", message),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::new("internal_error", message),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.body.error, self.body.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(&self.body)
    }
}

impl From<vg_core::Error> for ApiError {
    fn from(error: vg_core::Error) -> Self {
        match error {
            vg_core::Error::NotFound(msg) => Self::not_found(msg),
            vg_core::Error::Validation(msg) => Self::bad_request(msg),
            vg_core::Error::Analysis(msg) => Self::internal(msg),
            vg_core::Error::Source(msg) => Self::internal(format!("Source error: {}", msg)),
            vg_core::Error::Database(msg) => Self::internal(format!("Database error: {}", msg)),
            vg_core::Error::Config(msg) => Self::internal(format!("Configuration error: {}", msg)),
            vg_core::Error::External(msg) => {
                Self::internal(format!("External service error: {}", msg))
            }
            vg_core::Error::Storage(msg) => Self::internal(format!("Storage error: {}", msg)),
            vg_core::Error::Io(e) => Self::internal(format!("IO error: {}", e)),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::bad_request(errors.to_string())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
