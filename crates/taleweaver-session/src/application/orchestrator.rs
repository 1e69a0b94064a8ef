//! Advancement Orchestrator.
//!
//! Drives one advancement through the state machine: assemble context, ask
//! the narrator, validate, settle rewards, persist. Advancements of the same
//! campaign are serialized by [`CampaignLocks`].

use std::sync::Arc;
use std::time::Duration;

use taleweaver_core::campaign::Session;
use taleweaver_core::clock::Clock;
use taleweaver_core::command::Command;
use taleweaver_core::ids::CampaignId;
use taleweaver_core::repository::{CampaignReader, RewardStore};
use taleweaver_narrative::application::context_assembler::{ContextError, assemble_context};
use taleweaver_narrative::application::generator_client::{
    NarrationError, NarrativeGeneratorClient,
};
use taleweaver_rewards::application::command_handlers::handle_settle_rewards;
use taleweaver_rewards::domain::commands::SettleRewards;
use taleweaver_rewards::domain::settlement::SettlementReport;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::campaign_locks::CampaignLocks;
use super::session_persistence::{SessionDraft, SessionPersistenceManager};
use crate::domain::commands::{AdvanceCampaign, MAX_ACTION_CHARS};
use crate::domain::failure::AdvancementFailure;
use crate::domain::state::AdvancementState;

/// How long the narrator gets before the advancement is abandoned.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// A completed advancement.
#[derive(Debug, Clone)]
pub struct AdvancementOutcome {
    /// The campaign that advanced.
    pub campaign_id: CampaignId,
    /// The session that was written.
    pub session: Session,
    /// Its number.
    pub new_session_number: i32,
    /// True if at least one character×reward pair failed to apply.
    pub rewards_partially_applied: bool,
    /// Per-pair settlement results.
    pub settlement: SettlementReport,
}

/// Logs every state transition of one advancement.
struct Tracker {
    campaign_id: CampaignId,
    correlation_id: Uuid,
    state: AdvancementState,
}

impl Tracker {
    fn new(campaign_id: CampaignId, correlation_id: Uuid) -> Self {
        Self {
            campaign_id,
            correlation_id,
            state: AdvancementState::Idle,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            info!(
                campaign_id = %self.campaign_id,
                correlation_id = %self.correlation_id,
                from = %self.state,
                to = %next,
                "advancement state changed"
            );
            self.state = next;
        }
    }

    fn fail(&mut self, failure: AdvancementFailure) -> AdvancementFailure {
        let kind = failure.kind();
        debug_assert!(
            self.state.permits(kind),
            "{} cannot fail with {kind}",
            self.state
        );
        let failed = AdvancementState::Failed(kind);
        if failure.is_client_error() {
            info!(
                campaign_id = %self.campaign_id,
                correlation_id = %self.correlation_id,
                from = %self.state,
                to = %failed,
                %failure,
                "advancement rejected"
            );
        } else {
            warn!(
                campaign_id = %self.campaign_id,
                correlation_id = %self.correlation_id,
                from = %self.state,
                to = %failed,
                %failure,
                retryable = failure.is_retryable(),
                "advancement failed"
            );
        }
        self.state = failed;
        failure
    }
}

/// Runs advancements.
#[derive(Clone)]
pub struct AdvancementOrchestrator {
    reader: Arc<dyn CampaignReader>,
    rewards: Arc<dyn RewardStore>,
    narrator: NarrativeGeneratorClient,
    persistence: SessionPersistenceManager,
    clock: Arc<dyn Clock>,
    locks: CampaignLocks,
    generation_timeout: Duration,
}

impl std::fmt::Debug for AdvancementOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvancementOrchestrator")
            .field("generation_timeout", &self.generation_timeout)
            .finish_non_exhaustive()
    }
}

impl AdvancementOrchestrator {
    /// Wires an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        reader: Arc<dyn CampaignReader>,
        rewards: Arc<dyn RewardStore>,
        narrator: NarrativeGeneratorClient,
        persistence: SessionPersistenceManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reader,
            rewards,
            narrator,
            persistence,
            clock,
            locks: CampaignLocks::new(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Replaces the narrator deadline.
    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Advances a campaign by one session.
    ///
    /// Rewards are applied before the session is written and are not undone
    /// if the write fails; the failure reports how many were applied.
    ///
    /// # Errors
    ///
    /// Returns the [`AdvancementFailure`] of the state the advancement
    /// stopped in.
    #[instrument(
        skip_all,
        fields(
            campaign_id = %command.campaign_id,
            correlation_id = %command.correlation_id(),
            command_type = command.command_type(),
        )
    )]
    pub async fn advance(
        &self,
        command: &AdvanceCampaign,
    ) -> Result<AdvancementOutcome, AdvancementFailure> {
        let campaign_id = command.campaign_id;
        let mut tracker = Tracker::new(campaign_id, command.correlation_id);

        let action = command.action.trim();
        if action.is_empty() {
            return Err(tracker.fail(AdvancementFailure::InvalidRequest(
                "action must not be blank".to_owned(),
            )));
        }
        if action.chars().count() > MAX_ACTION_CHARS {
            return Err(tracker.fail(AdvancementFailure::InvalidRequest(format!(
                "action must be at most {MAX_ACTION_CHARS} characters"
            ))));
        }

        let _guard = self.locks.acquire(campaign_id).await;

        tracker.advance();
        let context = assemble_context(campaign_id, self.reader.as_ref())
            .await
            .map_err(|e| {
                tracker.fail(match e {
                    ContextError::CampaignNotFound(id) => AdvancementFailure::CampaignNotFound(id),
                    ContextError::NoActiveSession(id) => AdvancementFailure::NoActiveSession(id),
                    ContextError::Storage(e) => AdvancementFailure::StorageUnavailable(e.to_string()),
                })
            })?;

        tracker.advance();
        let generated =
            match tokio::time::timeout(self.generation_timeout, self.narrator.generate(&context, action))
                .await
            {
                Err(_) => {
                    return Err(tracker.fail(AdvancementFailure::GenerationUnavailable(format!(
                        "no answer within {}s",
                        self.generation_timeout.as_secs_f64()
                    ))));
                }
                Ok(Err(NarrationError::Unavailable(e))) => {
                    return Err(tracker.fail(AdvancementFailure::GenerationUnavailable(e.to_string())));
                }
                Ok(Err(NarrationError::Malformed(violation))) => {
                    tracker.advance();
                    return Err(tracker.fail(AdvancementFailure::MalformedGeneration(
                        violation.to_string(),
                    )));
                }
                Ok(Ok(generated)) => generated,
            };
        tracker.advance();

        tracker.advance();
        let settle = SettleRewards {
            correlation_id: command.correlation_id,
            campaign_id,
            rewards: generated.rewards,
            recipients: context.roster,
        };
        let settlement =
            handle_settle_rewards(&settle, self.clock.as_ref(), self.rewards.as_ref()).await;

        tracker.advance();
        let draft = SessionDraft {
            campaign_id,
            expected_previous: context.current_session.number,
            title: generated.session_title,
            narrative: generated.narrative,
            location: generated.location,
            choices: generated.choices,
        };
        let session = match self.persistence.persist(draft).await {
            Ok(session) => session,
            Err(e) => {
                let rewards_applied = settlement.applied_count();
                error!(
                    %campaign_id,
                    rewards_applied,
                    error = %e,
                    "session could not be persisted after rewards were settled"
                );
                return Err(tracker.fail(AdvancementFailure::PersistenceFailed {
                    reason: e.to_string(),
                    rewards_applied,
                }));
            }
        };

        tracker.advance();
        Ok(AdvancementOutcome {
            campaign_id,
            new_session_number: session.session_number,
            rewards_partially_applied: settlement.partial_failure(),
            session,
            settlement,
        })
    }
}
