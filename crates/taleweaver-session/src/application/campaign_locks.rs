//! Per-campaign advancement locks.
//!
//! Two advancements of the same campaign run one after the other; different
//! campaigns never wait on each other. A campaign's entry lives only while
//! someone holds or waits for its lock.

use std::sync::Arc;

use dashmap::DashMap;
use taleweaver_core::ids::CampaignId;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<CampaignId, Arc<Mutex<()>>>;

/// Registry of one async mutex per campaign.
#[derive(Debug, Clone, Default)]
pub struct CampaignLocks {
    locks: Arc<LockMap>,
}

/// Exclusive hold on one campaign. Releases the lock when dropped.
#[derive(Debug)]
pub struct CampaignGuard {
    campaign_id: CampaignId,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CampaignGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map's own reference is the only one left when nobody waits.
        self.locks
            .remove_if(&self.campaign_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl CampaignLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the campaign's lock. Held until the guard is dropped.
    pub async fn acquire(&self, campaign_id: CampaignId) -> CampaignGuard {
        // The map shard must be released before awaiting.
        let lock = Arc::clone(
            self.locks
                .entry(campaign_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let guard = lock.lock_owned().await;
        CampaignGuard {
            campaign_id,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of campaigns currently locked or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True if no campaign is locked or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
