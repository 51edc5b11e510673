//! Error types for registries, adapters and controllers.

use oxide_query::QueryError;
use thiserror::Error;

/// Errors raised by a [`DatabaseAdapter`](crate::adapter::DatabaseAdapter).
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement that must return a row returned none.
    #[error("statement returned no result")]
    NoResult,

    /// The adapter cannot represent a value or operation.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Registry, deriver and controller errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Builder or rendering error.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Invalid registry definition or controller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Error reported by the database adapter.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Malformed registry configuration.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Registry file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An event handler rejected the operation.
    #[error("event {event} failed: {message}")]
    Event {
        /// Event name.
        event: String,
        /// Reason given by the handler.
        message: String,
    },

    /// No row matched the primary key.
    #[error("object not found")]
    NotFound,

    /// A foreign key value has no matching source row.
    #[error("foreign key {field} references missing row {value}")]
    ForeignKey {
        /// Field holding the reference.
        field: String,
        /// Referenced value.
        value: String,
    },

    /// The request was valid but there was nothing to do.
    #[error("nothing to do: {0}")]
    NothingToDo(String),
}

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Adapter(AdapterError::Database(err))
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
