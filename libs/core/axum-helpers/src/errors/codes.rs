//! Machine-readable error codes carried in the `code` field of error responses.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    ValidationError,
    InvalidJson,
    InvalidUuid,
    InvalidQuery,
    /// A subtask was used as a parent.
    CannotHaveChildren,
    PayloadTooLarge,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InternalError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidUuid => "INVALID_UUID",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::CannotHaveChildren => "CANNOT_HAVE_CHILDREN",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Numeric code for log aggregation (1xxx client, 5xxx server).
    pub const fn code(&self) -> i32 {
        match self {
            Self::BadRequest => 1000,
            Self::ValidationError => 1001,
            Self::InvalidJson => 1002,
            Self::InvalidUuid => 1003,
            Self::InvalidQuery => 1004,
            Self::CannotHaveChildren => 1005,
            Self::PayloadTooLarge => 1006,
            Self::Unauthorized => 1101,
            Self::Forbidden => 1103,
            Self::NotFound => 1104,
            Self::Conflict => 1109,
            Self::InternalError => 5000,
            Self::ServiceUnavailable => 5003,
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest
            | Self::ValidationError
            | Self::InvalidJson
            | Self::InvalidUuid
            | Self::InvalidQuery
            | Self::CannotHaveChildren => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "The request could not be processed",
            Self::ValidationError => "Request validation failed",
            Self::InvalidJson => "The request body is not valid JSON",
            Self::InvalidUuid => "Invalid identifier format",
            Self::InvalidQuery => "Invalid query parameters",
            Self::CannotHaveChildren => "Parent todo cannot have children",
            Self::PayloadTooLarge => "The uploaded payload is too large",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::NotFound => "The requested resource was not found",
            Self::Conflict => "The resource already exists",
            Self::InternalError => "An internal error occurred",
            Self::ServiceUnavailable => "Service temporarily unavailable",
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
    fn test_serialized_form_matches_as_str() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::CannotHaveChildren,
            ErrorCode::NotFound,
            ErrorCode::InternalError,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::json!(code.as_str()));
        }
    }

    #[test]
    fn test_client_and_server_ranges() {
        assert!(ErrorCode::CannotHaveChildren.status().is_client_error());
        assert!(ErrorCode::CannotHaveChildren.code() < 5000);
        assert!(ErrorCode::ServiceUnavailable.status().is_server_error());
        assert!(ErrorCode::ServiceUnavailable.code() >= 5000);
    }
}
