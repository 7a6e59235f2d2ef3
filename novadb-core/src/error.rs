//! Error types for novadb operations.

use thiserror::Error;

/// Result type alias using novadb's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during novadb operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Vector dimension mismatch between index and input.
    #[error("dimension mismatch: expected {expected}, actual {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Attempted to insert a duplicate vector id.
    #[error("duplicate vector id: {0}")]
    Duplicate(String),

    /// Vector with the given id was not found.
    #[error("vector not found: {0}")]
    NotFound(String),

    /// A configuration value was rejected.
    #[error("invalid config: field {field}, value {value}: {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    /// A snapshot save/load operation failed.
    #[error("persistence error during {operation} at {path}: {cause}")]
    PersistenceError {
        operation: String,
        path: String,
        cause: String,
    },

    /// A facade-level operation failed for a reason not covered above.
    #[error("database error during {operation}: {cause}")]
    DatabaseError { operation: String, cause: String },
}
