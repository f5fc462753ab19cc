//! Error types for the reconciliation API.
//!
//! Store errors from the persistence layer are mapped to HTTP status codes:
//!
//! | Store Error | HTTP Status |
//! |-------------|-------------|
//! | Query (malformed constraint) | 400 |
//! | Backend unavailable, connection or pool failure | 503 |
//! | Any other backend or load failure | 500 |
//!
//! Unknown entities in an extend request are reported as 404. Every error
//! body is `{"status": <code>, "message": <text>}`.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use recon_persistence::error::{BackendError, StoreError};
use tracing::{error, warn};

/// The error type of the reconciliation handlers.
#[derive(Debug)]
pub enum RestError {
    /// Malformed request parameters (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// An entity requested by id does not exist (HTTP 404).
    NotFound {
        /// The requested entity id.
        id: String,
    },

    /// The backing store cannot serve requests right now (HTTP 503).
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::NotFound { id } => write!(f, "entity not found: {}", id),
            RestError::ServiceUnavailable { message } => {
                write!(f, "Service unavailable: {}", message)
            }
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl RestError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a [`RestError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest {
            message: message.into(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = serde_json::json!({
            "status": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Query(e) => RestError::BadRequest {
                message: e.to_string(),
            },
            StoreError::Backend(e) => e.into(),
            StoreError::Load(e) => RestError::InternalError {
                message: e.to_string(),
            },
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable { .. }
            | BackendError::ConnectionFailed { .. }
            | BackendError::PoolExhausted { .. } => RestError::ServiceUnavailable {
                message: err.to_string(),
            },
            _ => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

/// Result type for REST handlers.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use recon_persistence::error::QueryError;

    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: RestError = StoreError::from(QueryError::MalformedConstraint {
            property_id: "born".to_string(),
            message: "value is null".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: RestError = StoreError::from(BackendError::Unavailable {
            backend_name: "sqlite".to_string(),
            message: "gone".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: RestError = StoreError::from(BackendError::SchemaError {
            message: "missing tables".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_body() {
        let response = RestError::NotFound {
            id: "person:q0".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_display() {
        let err = RestError::NotFound {
            id: "person:q0".to_string(),
        };
        assert_eq!(err.to_string(), "entity not found: person:q0");
        assert_eq!(
            RestError::bad_request("bad callback").to_string(),
            "Bad request: bad callback"
        );
    }
}
