//! Typed reasons an advancement can fail.

use std::fmt;

use taleweaver_core::ids::CampaignId;
use thiserror::Error;

/// Why an advancement ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvancementFailure {
    /// The request itself is unusable.
    #[error("invalid advancement request: {0}")]
    InvalidRequest(String),

    /// The campaign does not exist.
    #[error("campaign {0} does not exist")]
    CampaignNotFound(CampaignId),

    /// The campaign has no session to advance from.
    #[error("campaign {0} has no active session to advance from")]
    NoActiveSession(CampaignId),

    /// Campaign state could not be read.
    #[error("campaign state could not be read: {0}")]
    StorageUnavailable(String),

    /// The narrator timed out, errored or was rate limited.
    #[error("narrator unavailable: {0}")]
    GenerationUnavailable(String),

    /// The narrator answered with output that breaks the session contract.
    #[error("narrator output was malformed: {0}")]
    MalformedGeneration(String),

    /// The new session could not be written. Rewards settled before the
    /// write stay applied.
    #[error("failed to persist session ({rewards_applied} reward grants already applied): {reason}")]
    PersistenceFailed {
        /// Underlying storage error.
        reason: String,
        /// Character×reward pairs that were applied before the failure.
        rewards_applied: usize,
    },
}

/// Data-free discriminant of [`AdvancementFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`AdvancementFailure::InvalidRequest`].
    InvalidRequest,
    /// See [`AdvancementFailure::CampaignNotFound`].
    CampaignNotFound,
    /// See [`AdvancementFailure::NoActiveSession`].
    NoActiveSession,
    /// See [`AdvancementFailure::StorageUnavailable`].
    StorageUnavailable,
    /// See [`AdvancementFailure::GenerationUnavailable`].
    GenerationUnavailable,
    /// See [`AdvancementFailure::MalformedGeneration`].
    MalformedGeneration,
    /// See [`AdvancementFailure::PersistenceFailed`].
    PersistenceFailed,
}

impl FailureKind {
    /// Machine-readable code used in API responses and logs.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::CampaignNotFound => "campaign_not_found",
            Self::NoActiveSession => "no_active_session",
            Self::StorageUnavailable => "storage_unavailable",
            Self::GenerationUnavailable => "generation_unavailable",
            Self::MalformedGeneration => "malformed_generation",
            Self::PersistenceFailed => "persistence_failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl AdvancementFailure {
    /// The failure's discriminant.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::CampaignNotFound(_) => FailureKind::CampaignNotFound,
            Self::NoActiveSession(_) => FailureKind::NoActiveSession,
            Self::StorageUnavailable(_) => FailureKind::StorageUnavailable,
            Self::GenerationUnavailable(_) => FailureKind::GenerationUnavailable,
            Self::MalformedGeneration(_) => FailureKind::MalformedGeneration,
            Self::PersistenceFailed { .. } => FailureKind::PersistenceFailed,
        }
    }

    /// True only for failures a caller may resubmit unchanged. Resubmitting
    /// after any other failure either fails again or generates a different
    /// narrative.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationUnavailable(_))
    }

    /// True for failures caused by the request rather than the service.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::CampaignNotFound(_) | Self::NoActiveSession(_)
        )
    }

    /// Message safe to show a player. Never includes model output or
    /// storage details.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(reason) => format!("Invalid request: {reason}"),
            Self::CampaignNotFound(id) => format!("Campaign {id} was not found"),
            Self::NoActiveSession(_) => {
                "This campaign has no active session to continue from".to_owned()
            }
            Self::StorageUnavailable(_) => {
                "The campaign could not be loaded right now".to_owned()
            }
            Self::GenerationUnavailable(_) => {
                "The narrator is unavailable right now, please try again".to_owned()
            }
            Self::MalformedGeneration(_) => {
                "The narrator produced an unusable story, please submit your action again"
                    .to_owned()
            }
            Self::PersistenceFailed { .. } => {
                "The new session could not be saved, please submit your action again".to_owned()
            }
        }
    }
}
