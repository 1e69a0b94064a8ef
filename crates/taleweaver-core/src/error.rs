//! Domain error types.

use thiserror::Error;

/// Error returned by storage ports and domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A record was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (`"campaign"`, `"session"`, ...).
        entity: &'static str,
        /// Identifier that was looked up.
        id: i64,
    },

    /// A uniqueness or ordering constraint was violated by a concurrent writer.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
