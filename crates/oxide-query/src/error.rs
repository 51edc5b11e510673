//! Error types for statement accumulation and rendering.

use thiserror::Error;

/// Errors raised while accumulating or rendering a statement.
///
/// Every builder call either succeeds completely or returns one of these
/// before any state is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A required builder parameter was empty.
    #[error("{method}: value required for {parameter}")]
    Required {
        /// Builder method that rejected the call.
        method: &'static str,
        /// Name of the offending parameter.
        parameter: &'static str,
    },

    /// Any other invalid builder or registry input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The field handler could not coerce a value to its declared type.
    #[error("cannot sanitize {field} as {data_type}: {message}")]
    Sanitization {
        /// Field (or column) being sanitized.
        field: String,
        /// Declared data type.
        data_type: String,
        /// Reason the value was rejected.
        message: String,
    },

    /// The statement lacks something it cannot be rendered without.
    #[error("incomplete statement: {0}")]
    Incomplete(String),
}

impl QueryError {
    pub(crate) const fn required(method: &'static str, parameter: &'static str) -> Self {
        Self::Required { method, parameter }
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
