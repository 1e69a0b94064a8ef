//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use taleweaver_core::clock::Clock;
use taleweaver_core::generation::TextGenerator;
use taleweaver_core::repository::{CampaignReader, RewardStore, SessionStore};
use taleweaver_narrative::application::generator_client::NarrativeGeneratorClient;
use taleweaver_session::application::orchestrator::AdvancementOrchestrator;
use taleweaver_session::application::session_persistence::SessionPersistenceManager;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs advancements.
    pub orchestrator: Arc<AdvancementOrchestrator>,
    /// Campaign reads for the query endpoints.
    pub campaigns: Arc<dyn CampaignReader>,
    /// Session reads for the query endpoints.
    pub sessions: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires the orchestrator and query ports over one store.
    #[must_use]
    pub fn new<S>(
        store: S,
        narrator: Arc<dyn TextGenerator>,
        clock: Arc<dyn Clock>,
        generation_timeout: Duration,
    ) -> Self
    where
        S: CampaignReader + RewardStore + SessionStore + 'static,
    {
        let store = Arc::new(store);
        let persistence = SessionPersistenceManager::new(store.clone(), Arc::clone(&clock));
        let orchestrator = AdvancementOrchestrator::new(
            store.clone(),
            store.clone(),
            NarrativeGeneratorClient::new(narrator),
            persistence,
            clock,
        )
        .with_generation_timeout(generation_timeout);

        Self {
            orchestrator: Arc::new(orchestrator),
            campaigns: store.clone(),
            sessions: store,
        }
    }
}
