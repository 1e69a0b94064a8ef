//! Storage ports.
//!
//! The advancement engine never talks to a database directly. Reads and
//! writes go through these traits, which the PostgreSQL store and the
//! in-memory test store implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::campaign::{Campaign, DiceRollFact, NewSession, RosterEntry, Session};
use crate::error::DomainError;
use crate::ids::{CampaignId, CharacterId, ItemId};
use crate::reward::{CatalogItemSpec, Purse};

/// Read-only access to campaign state used to assemble generation context.
#[async_trait]
pub trait CampaignReader: Send + Sync {
    /// Loads a campaign, or `None` if it does not exist.
    async fn find_campaign(&self, campaign_id: CampaignId)
    -> Result<Option<Campaign>, DomainError>;

    /// Loads the highest-numbered session of a campaign.
    async fn latest_session(&self, campaign_id: CampaignId)
    -> Result<Option<Session>, DomainError>;

    /// Lists the characters of all active participants, ordered by turn
    /// order (unordered participants last, then by character id).
    async fn active_roster(&self, campaign_id: CampaignId)
    -> Result<Vec<RosterEntry>, DomainError>;

    /// Loads the most recent dice roll made in the campaign.
    async fn latest_roll(&self, campaign_id: CampaignId)
    -> Result<Option<DiceRollFact>, DomainError>;
}

/// Explicit delta operations on characters and the shared item catalog.
///
/// Each method is atomic on its own. Nothing here spans several
/// characters.
#[async_trait]
pub trait RewardStore: Send + Sync {
    /// Returns the id of the catalog item named exactly `item.name`,
    /// creating it if absent. Concurrent calls with the same name resolve to
    /// the same item.
    async fn upsert_catalog_item(&self, item: &CatalogItemSpec) -> Result<ItemId, DomainError>;

    /// Adds one unit of `item_id` to the character's inventory, inserting an
    /// unequipped row with quantity 1 if none exists. Returns the new
    /// quantity.
    async fn grant_item(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> Result<i32, DomainError>;

    /// Adds `delta_copper` to the character's balance and appends one ledger
    /// entry in the same transaction. Returns the new purse.
    ///
    /// Fails with `DomainError::Validation` if the balance would go negative,
    /// leaving both balance and ledger untouched.
    async fn apply_currency_delta(
        &self,
        character_id: CharacterId,
        delta_copper: i64,
        reason: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<Purse, DomainError>;

    /// Adds experience points to the character. Returns the new total.
    async fn add_experience(
        &self,
        character_id: CharacterId,
        amount: i64,
    ) -> Result<i64, DomainError>;

    /// Reads the character's current purse.
    async fn purse(&self, character_id: CharacterId) -> Result<Purse, DomainError>;

    /// Sums every ledger entry recorded for the character.
    async fn ledger_total(&self, character_id: CharacterId) -> Result<i64, DomainError>;
}

/// Session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a transaction that holds the campaign's write lock until it is
    /// committed or dropped. Dropping without commit discards every write.
    ///
    /// Fails with `DomainError::NotFound` if the campaign does not exist.
    async fn begin_advance(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Box<dyn SessionTransaction>, DomainError>;

    /// Loads one session by its number.
    async fn find_session(
        &self,
        campaign_id: CampaignId,
        session_number: i32,
    ) -> Result<Option<Session>, DomainError>;
}

/// Writes performed while a campaign's write lock is held.
#[async_trait]
pub trait SessionTransaction: Send {
    /// Highest persisted session number, read under the lock.
    async fn latest_session_number(&mut self) -> Result<Option<i32>, DomainError>;

    /// Marks a session completed.
    async fn complete_session(
        &mut self,
        session_number: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Inserts a session row.
    async fn insert_session(&mut self, session: &NewSession) -> Result<Session, DomainError>;

    /// Moves the campaign's current-session pointer.
    async fn set_current_session(&mut self, session_number: i32) -> Result<(), DomainError>;

    /// Makes every write of this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}
