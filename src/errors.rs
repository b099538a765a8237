// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the grid pipeline and its endpoints

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure path of the pipeline returns one of these.
/// Each variant maps to an HTTP status code and a JSON error body
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid bounding box: {0}")]
    InvalidBounds(String),

    #[error("No valid lenses in request: {0}")]
    NoValidLenses(String),

    #[error("Lens selection is empty")]
    EmptyLensSelection,

    #[error("Cannot normalize an empty set of grid cells")]
    EmptyInput,

    #[error("Sample source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GridError {
    fn code(&self) -> &'static str {
        match self {
            GridError::InvalidBounds(_) => "INVALID_BOUNDS",
            GridError::NoValidLenses(_) => "NO_VALID_LENSES",
            GridError::EmptyLensSelection => "EMPTY_LENS_SELECTION",
            GridError::EmptyInput => "EMPTY_INPUT",
            GridError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            GridError::InvalidInput(_) => "INVALID_INPUT",
            GridError::ValidationError(_) => "VALIDATION_ERROR",
            GridError::Unauthorized => "UNAUTHORIZED",
            GridError::Forbidden => "FORBIDDEN",
            GridError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            GridError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            GridError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert GridError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for GridError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            GridError::InvalidBounds(_) => StatusCode::BAD_REQUEST,
            GridError::NoValidLenses(_) => StatusCode::BAD_REQUEST,
            GridError::EmptyLensSelection => StatusCode::BAD_REQUEST,
            GridError::EmptyInput => StatusCode::INTERNAL_SERVER_ERROR,
            GridError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GridError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GridError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GridError::Unauthorized => StatusCode::UNAUTHORIZED,
            GridError::Forbidden => StatusCode::FORBIDDEN,
            GridError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            GridError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            GridError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_client_errors() {
        assert_eq!(
            GridError::InvalidBounds("north <= south".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GridError::NoValidLenses("roads".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GridError::EmptyInput.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_body_carries_code() {
        let response = GridError::RateLimitExceeded.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(GridError::RateLimitExceeded.code(), "RATE_LIMIT_EXCEEDED");
    }
}
