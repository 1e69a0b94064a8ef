//! The advancement state machine.
//!
//! ```text
//! Idle -> AssemblingContext -> Generating -> ValidatingOutput
//!      -> SettlingRewards -> Persisting -> Advanced
//! ```
//!
//! Any non-terminal state may instead move to `Failed`. Each state names the
//! failures it can produce.

use std::fmt;

use super::failure::FailureKind;

/// Where one advancement currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancementState {
    /// Request received, nothing done yet.
    Idle,
    /// Reading campaign state.
    AssemblingContext,
    /// Waiting for the narrator.
    Generating,
    /// Checking the narrator's answer against the contract.
    ValidatingOutput,
    /// Applying rewards to the party.
    SettlingRewards,
    /// Writing the new session.
    Persisting,
    /// The new session is durable.
    Advanced,
    /// The advancement stopped.
    Failed(FailureKind),
}

impl AdvancementState {
    /// The next state on the success path, or `None` from a terminal state.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::AssemblingContext),
            Self::AssemblingContext => Some(Self::Generating),
            Self::Generating => Some(Self::ValidatingOutput),
            Self::ValidatingOutput => Some(Self::SettlingRewards),
            Self::SettlingRewards => Some(Self::Persisting),
            Self::Persisting => Some(Self::Advanced),
            Self::Advanced | Self::Failed(_) => None,
        }
    }

    /// True for `Advanced` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Advanced | Self::Failed(_))
    }

    /// Whether this state can fail with `kind`.
    ///
    /// Reward settlement never fails as a whole, so `SettlingRewards` permits
    /// nothing.
    #[must_use]
    pub fn permits(self, kind: FailureKind) -> bool {
        match self {
            Self::Idle => kind == FailureKind::InvalidRequest,
            Self::AssemblingContext => matches!(
                kind,
                FailureKind::CampaignNotFound
                    | FailureKind::NoActiveSession
                    | FailureKind::StorageUnavailable
            ),
            Self::Generating => kind == FailureKind::GenerationUnavailable,
            Self::ValidatingOutput => kind == FailureKind::MalformedGeneration,
            Self::Persisting => kind == FailureKind::PersistenceFailed,
            Self::SettlingRewards | Self::Advanced | Self::Failed(_) => false,
        }
    }

    /// Lowercase state name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AssemblingContext => "assembling_context",
            Self::Generating => "generating",
            Self::ValidatingOutput => "validating_output",
            Self::SettlingRewards => "settling_rewards",
            Self::Persisting => "persisting",
            Self::Advanced => "advanced",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for AdvancementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "failed({kind})"),
            other => f.write_str(other.name()),
        }
    }
}
