//! The `PostgreSQL` store and its error mapping.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use taleweaver_core::error::DomainError;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// PostgreSQL-backed implementation of every storage port.
#[derive(Debug, Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Converts a driver error into the port error type.
pub(crate) fn storage_error(error: sqlx::Error) -> DomainError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.message().to_owned())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_check_violation() => {
            DomainError::Validation(db.message().to_owned())
        }
        _ => DomainError::Infrastructure(error.to_string()),
    }
}
