//! Settlement outcomes.

use taleweaver_core::ids::{CharacterId, ItemId};
use taleweaver_core::reward::{Purse, RewardKind};

/// Ledger reason recorded for a currency reward.
#[must_use]
pub fn ledger_reason(reward_name: &str) -> String {
    format!("Reward from adventure: {reward_name}")
}

/// What a successful character×reward application changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedReward {
    /// Coins were credited.
    Currency {
        /// Purse after the credit.
        purse: Purse,
    },
    /// An item was added to the inventory.
    Item {
        /// Catalog item.
        item_id: ItemId,
        /// Quantity held after the grant.
        quantity: i32,
    },
    /// Experience was added.
    Experience {
        /// Experience total after the award.
        total: i64,
    },
}

/// Result for one character and one reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    /// Recipient.
    pub character_id: CharacterId,
    /// Reward name.
    pub reward_name: String,
    /// Reward kind.
    pub kind: RewardKind,
    /// What changed, or why nothing did.
    pub result: Result<AppliedReward, String>,
}

/// Every pair's outcome for one settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Outcomes in settlement order.
    pub outcomes: Vec<PairOutcome>,
}

impl SettlementReport {
    /// True if at least one pair failed to apply.
    #[must_use]
    pub fn partial_failure(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_err())
    }

    /// Number of pairs that applied.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of pairs that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }

    /// Outcomes for one character.
    pub fn for_character(&self, character_id: CharacterId) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.character_id == character_id)
    }
}
