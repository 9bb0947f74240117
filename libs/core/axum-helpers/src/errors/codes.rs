//! Type-safe error codes for API responses.
//!
//! Each code carries:
//! - a SCREAMING_SNAKE_CASE identifier for clients (e.g. "VALIDATION_ERROR")
//! - an integer for logs and dashboards (e.g. 1001)
//! - a default human-readable message
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000s)
    /// Body or query failed schema validation
    ValidationError,
    /// Query string could not be parsed
    InvalidQuery,
    /// Body could not be read as JSON
    JsonExtraction,
    NotFound,
    MethodNotAllowed,
    Conflict,
    /// Well-formed request rejected by a business rule
    UnprocessableEntity,
    BadRequest,

    // Server errors (1000s, continued)
    InternalError,
    ServiceUnavailable,

    // Database errors (2000s)
    /// Storage unreachable or failed mid-operation; safe to retry
    DatabaseError,

    // Serialization errors (5000s)
    SerdeJsonError,
}

impl ErrorCode {
    /// Identifier clients match on
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Integer code used in structured logs.
    ///
    /// - 1000-1999: request and service errors
    /// - 2000-2999: database errors
    /// - 5000-5999: serialization errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidQuery => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::MethodNotAllowed => 1006,
            Self::Conflict => 1008,
            Self::UnprocessableEntity => 1009,
            Self::BadRequest => 1010,
            Self::ServiceUnavailable => 1011,
            Self::DatabaseError => 2003,
            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidQuery => "Invalid query parameters",
            Self::JsonExtraction => "Failed to extract JSON from request body",
            Self::NotFound => "The requested resource was not found",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::Conflict => "Resource already exists",
            Self::UnprocessableEntity => "The request could not be processed",
            Self::BadRequest => "Bad request",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::DatabaseError => "The database is temporarily unavailable",
            Self::SerdeJsonError => "Failed to process JSON data",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_as_str() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::NotFound,
            ErrorCode::DatabaseError,
            ErrorCode::UnprocessableEntity,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::json!(code.as_str()));
        }
    }

    #[test]
    fn test_codes_are_grouped_by_range() {
        assert!((1000..2000).contains(&ErrorCode::NotFound.code()));
        assert!((2000..3000).contains(&ErrorCode::DatabaseError.code()));
        assert!((5000..6000).contains(&ErrorCode::SerdeJsonError.code()));
    }

    #[test]
    fn test_display_uses_identifier() {
        assert_eq!(ErrorCode::InvalidQuery.to_string(), "INVALID_QUERY");
    }
}
