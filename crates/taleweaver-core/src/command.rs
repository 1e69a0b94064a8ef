//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name of the command, used as a log field.
    fn command_type(&self) -> &'static str;

    /// Correlation ID that follows the command through every log line and
    /// ledger entry it causes.
    fn correlation_id(&self) -> Uuid;
}
