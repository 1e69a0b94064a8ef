//! Session Persistence Manager.
//!
//! Assigns the next session number and writes the new session, the
//! completion of the previous one and the campaign pointer in a single
//! transaction. Either all three land or none do.

use std::sync::Arc;

use taleweaver_core::campaign::{Choice, NewSession, Session};
use taleweaver_core::clock::Clock;
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::CampaignId;
use taleweaver_core::repository::SessionStore;
use tracing::{info, warn};

use crate::domain::numbering::{next_session_number, session_experience_reward};

/// A validated session waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    /// Campaign being advanced.
    pub campaign_id: CampaignId,
    /// Session number the context was assembled from.
    pub expected_previous: i32,
    /// Session title.
    pub title: String,
    /// Narrative text.
    pub narrative: String,
    /// Where the party is.
    pub location: String,
    /// Exactly four follow-up choices.
    pub choices: Vec<Choice>,
}

/// Writes new sessions.
#[derive(Clone)]
pub struct SessionPersistenceManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionPersistenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPersistenceManager")
            .finish_non_exhaustive()
    }
}

impl SessionPersistenceManager {
    /// Creates a manager over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Persists `draft` as the campaign's next session.
    ///
    /// The number is read under the campaign's write lock, so it is always
    /// one more than the highest persisted number even if another writer got
    /// in since the context was assembled.
    ///
    /// # Errors
    ///
    /// Returns the store's error if any write fails. Nothing is persisted in
    /// that case.
    pub async fn persist(&self, draft: SessionDraft) -> Result<Session, DomainError> {
        let mut tx = self.store.begin_advance(draft.campaign_id).await?;

        let previous = tx.latest_session_number().await?.unwrap_or(0);
        if previous != draft.expected_previous {
            warn!(
                campaign_id = %draft.campaign_id,
                expected = draft.expected_previous,
                actual = previous,
                "campaign advanced since context was assembled"
            );
        }

        let number = next_session_number(previous);
        let now = self.clock.now();
        if previous > 0 {
            tx.complete_session(previous, now).await?;
        }
        let session = tx
            .insert_session(&NewSession {
                campaign_id: draft.campaign_id,
                session_number: number,
                title: draft.title,
                narrative: draft.narrative,
                location: draft.location,
                choices: draft.choices,
                experience_reward: session_experience_reward(number),
                created_at: now,
            })
            .await?;
        tx.set_current_session(number).await?;
        tx.commit().await?;

        info!(
            campaign_id = %draft.campaign_id,
            session_number = number,
            session_id = %session.id,
            "session persisted"
        );
        Ok(session)
    }
}
