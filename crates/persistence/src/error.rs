//! Error types for the persistence layer.
//!
//! Errors are grouped by the way callers are expected to react to them:
//!
//! - [`QueryError`] - the request itself is malformed and must be rejected
//! - [`BackendError`] - the storage engine failed or is unreachable
//! - [`LoadError`] - a dataset could not be parsed or resolved at startup
//!
//! "Not found" and "no results" are not errors: lookups return `Option` and
//! searches return an empty list.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed query input.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Backend-specific errors.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Dataset loading errors.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl StoreError {
    /// Returns true when the error was caused by the caller's input.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, StoreError::Query(_))
    }

    /// Returns true when the storage engine could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Backend(
                BackendError::Unavailable { .. }
                    | BackendError::ConnectionFailed { .. }
                    | BackendError::PoolExhausted { .. }
            )
        )
    }
}

/// Errors caused by the content of a query request.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A property constraint value could not be interpreted.
    #[error("malformed value for property constraint '{property_id}': {message}")]
    MalformedConstraint {
        property_id: String,
        message: String,
    },
}

/// Errors originating from the storage engine.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// The database does not have the expected tables.
    #[error("schema error: {message}")]
    SchemaError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Errors raised while reading or resolving a dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The header line is missing or malformed.
    #[error("invalid header: {message}")]
    InvalidHeader { message: String },

    /// A data row does not have the expected shape.
    #[error("invalid row at line {line}: {message}")]
    InvalidRow { line: usize, message: String },

    /// A JSON column could not be decoded.
    #[error("invalid JSON at line {line}: {message}")]
    InvalidJson { line: usize, message: String },

    /// An import configuration could not be decoded.
    #[error("invalid import configuration {path}: {message}")]
    InvalidConfig { path: String, message: String },

    /// A CSV or tab-separated source file could not be parsed.
    #[error("invalid table {path}: {message}")]
    InvalidTable { path: String, message: String },

    /// An entity has no type and the dataset declares no default type.
    #[error("entity '{key}' has no type and no default type is declared")]
    MissingType { key: String },
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal {
            backend_name: "unknown".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StoreError {
    fn from(_err: r2d2::Error) -> Self {
        StoreError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}
