use thiserror::Error;

use crate::CounterScope;

/// Errors that can occur when allocating sequence values.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// The counter for this scope has not been provisioned.
    #[error("Counter not found: {0}")]
    CounterNotFound(CounterScope),

    /// The counter moved past the range its consumers can represent.
    #[error("Counter {scope} exhausted: value {value} exceeds maximum {max}")]
    Exhausted {
        scope: CounterScope,
        value: u64,
        max: u64,
    },

    /// The backing store rejected or could not serve the request.
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for sequence operations.
pub type Result<T> = std::result::Result<T, SequenceError>;
