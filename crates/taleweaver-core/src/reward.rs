//! Rewards, currency and the item catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::CharacterId;

/// Copper pieces in one silver piece.
pub const COPPER_PER_SILVER: i64 = 10;

/// Copper pieces in one gold piece.
pub const COPPER_PER_GOLD: i64 = 100;

/// What a reward grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    /// Coins, valued in copper.
    Currency,
    /// One unit of a catalog item.
    Item,
    /// Experience points.
    Experience,
}

impl RewardKind {
    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Item => "item",
            Self::Experience => "experience",
        }
    }
}

/// A reward produced by the narrator for the whole party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDescriptor {
    /// What the reward grants.
    pub kind: RewardKind,
    /// Display name; for items, the catalog name.
    pub name: String,
    /// Flavour text; becomes the catalog description for new items.
    #[serde(default)]
    pub description: String,
    /// Copper for currency, points for experience, ignored for items.
    pub value: i64,
    /// Rarity tag for new catalog items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

/// Item catalog values used when resolving an item by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItemSpec {
    /// Exact catalog name.
    pub name: String,
    /// Description stored if the item is created.
    pub description: String,
    /// Rarity stored if the item is created.
    pub rarity: Option<String>,
}

/// A character's coins split into denominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Purse {
    /// Gold pieces.
    pub gold: i64,
    /// Silver pieces.
    pub silver: i64,
    /// Copper pieces.
    pub copper: i64,
}

impl Purse {
    /// Splits a copper-equivalent total into the fewest coins.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `total` is negative.
    pub fn from_copper(total: i64) -> Result<Self, DomainError> {
        if total < 0 {
            return Err(DomainError::Validation(format!(
                "currency balance cannot be negative: {total} copper"
            )));
        }
        Ok(Self {
            gold: total / COPPER_PER_GOLD,
            silver: (total % COPPER_PER_GOLD) / COPPER_PER_SILVER,
            copper: total % COPPER_PER_SILVER,
        })
    }

    /// Copper-equivalent value of every coin in the purse.
    #[must_use]
    pub fn total_copper(&self) -> i64 {
        self.gold * COPPER_PER_GOLD + self.silver * COPPER_PER_SILVER + self.copper
    }

    /// Returns the purse after adding `delta` copper, re-split into
    /// denominations.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the result would be negative or
    /// overflow.
    pub fn credit(&self, delta: i64) -> Result<Self, DomainError> {
        let total = self.total_copper().checked_add(delta).ok_or_else(|| {
            DomainError::Validation(format!("currency delta {delta} overflows balance"))
        })?;
        Self::from_copper(total)
    }
}

/// One append-only row of the currency ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Character whose balance changed.
    pub character_id: CharacterId,
    /// Signed copper-equivalent change.
    pub delta_copper: i64,
    /// Why the balance changed.
    pub reason: String,
    /// When the change was recorded.
    pub recorded_at: DateTime<Utc>,
}
