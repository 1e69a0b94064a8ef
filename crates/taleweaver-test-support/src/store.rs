//! In-memory implementation of every storage port, with failure injection.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taleweaver_core::campaign::{Campaign, DiceRollFact, NewSession, RosterEntry, Session};
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::{CampaignId, CharacterId, ItemId, SessionId, UserId};
use taleweaver_core::repository::{CampaignReader, RewardStore, SessionStore, SessionTransaction};
use taleweaver_core::reward::{CatalogItemSpec, LedgerEntry, Purse};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Clone)]
struct CharacterRow {
    name: String,
    race: String,
    class_name: String,
    level: i32,
    purse: Purse,
    experience: i64,
}

#[derive(Debug, Clone)]
struct ParticipantRow {
    campaign_id: CampaignId,
    user_id: UserId,
    character_id: CharacterId,
    turn_order: Option<i32>,
    is_active: bool,
}

#[derive(Debug, Clone)]
struct CatalogRow {
    id: ItemId,
    spec: CatalogItemSpec,
}

#[derive(Debug, Clone, Copy)]
struct InventoryRow {
    quantity: i32,
    equipped: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: i64,
    campaigns: BTreeMap<CampaignId, Campaign>,
    sessions: Vec<Session>,
    characters: BTreeMap<CharacterId, CharacterRow>,
    participants: Vec<ParticipantRow>,
    catalog: Vec<CatalogRow>,
    inventory: BTreeMap<(CharacterId, ItemId), InventoryRow>,
    ledger: Vec<LedgerEntry>,
    rolls: Vec<(CampaignId, DiceRollFact)>,
}

impl StoreState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest_session_number(&self, campaign_id: CampaignId) -> Option<i32> {
        self.sessions
            .iter()
            .filter(|s| s.campaign_id == campaign_id)
            .map(|s| s.session_number)
            .max()
    }

    fn character_mut(&mut self, character_id: CharacterId) -> Result<&mut CharacterRow, DomainError> {
        self.characters
            .get_mut(&character_id)
            .ok_or_else(|| DomainError::not_found("character", character_id))
    }
}

#[derive(Debug, Default)]
struct FailurePlan {
    reads: bool,
    session_writes: bool,
    reward_characters: HashSet<CharacterId>,
    reward_items: HashSet<String>,
}

/// A store that keeps everything in process memory.
///
/// Session transactions serialise on a per-store async lock, the same way
/// the PostgreSQL store serialises on the campaign row.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    failures: Arc<Mutex<FailurePlan>>,
}

fn injected() -> DomainError {
    DomainError::Infrastructure("injected failure".into())
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- seeding ---

    /// Adds a campaign with no sessions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_campaign(&self, title: &str, description: &str) -> CampaignId {
        let mut state = self.state.lock().unwrap();
        let id = CampaignId(state.allocate_id());
        state.campaigns.insert(
            id,
            Campaign {
                id,
                title: title.to_owned(),
                description: description.to_owned(),
                current_session: 0,
                current_turn_user_id: None,
            },
        );
        id
    }

    /// Adds a persisted session and moves the campaign pointer to it.
    ///
    /// # Panics
    ///
    /// Panics if the campaign does not exist or the mutex is poisoned.
    pub fn add_session(
        &self,
        campaign_id: CampaignId,
        session_number: i32,
        title: &str,
        location: &str,
    ) -> SessionId {
        let mut state = self.state.lock().unwrap();
        let id = SessionId(state.allocate_id());
        state.sessions.push(Session {
            id,
            campaign_id,
            session_number,
            title: title.to_owned(),
            narrative: format!("The adventure continues at {location}."),
            location: location.to_owned(),
            choices: Vec::new(),
            experience_reward: 100 + 25 * i64::from(session_number),
            is_completed: false,
            completed_at: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        });
        let campaign = state.campaigns.get_mut(&campaign_id).unwrap();
        campaign.current_session = session_number;
        id
    }

    /// Adds a character with an empty purse.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_character(&self, name: &str, race: &str, class_name: &str, level: i32) -> CharacterId {
        let mut state = self.state.lock().unwrap();
        let id = CharacterId(state.allocate_id());
        state.characters.insert(
            id,
            CharacterRow {
                name: name.to_owned(),
                race: race.to_owned(),
                class_name: class_name.to_owned(),
                level,
                purse: Purse::default(),
                experience: 0,
            },
        );
        id
    }

    /// Links a character to a campaign.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_participant(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
        character_id: CharacterId,
        turn_order: Option<i32>,
        is_active: bool,
    ) {
        self.state.lock().unwrap().participants.push(ParticipantRow {
            campaign_id,
            user_id,
            character_id,
            turn_order,
            is_active,
        });
    }

    /// Adds a catalog item directly.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_catalog_item(&self, name: &str, description: &str, rarity: Option<&str>) -> ItemId {
        let mut state = self.state.lock().unwrap();
        let id = ItemId(state.allocate_id());
        state.catalog.push(CatalogRow {
            id,
            spec: CatalogItemSpec {
                name: name.to_owned(),
                description: description.to_owned(),
                rarity: rarity.map(str::to_owned),
            },
        });
        id
    }

    /// Records a dice roll for a campaign.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record_roll(&self, campaign_id: CampaignId, roll: DiceRollFact) {
        self.state.lock().unwrap().rolls.push((campaign_id, roll));
    }

    // --- failure injection ---

    /// Makes every `CampaignReader` call fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_reads(&self) {
        self.failures.lock().unwrap().reads = true;
    }

    /// Makes session inserts fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_session_writes(&self) {
        self.failures.lock().unwrap().session_writes = true;
    }

    /// Makes every reward write for `character_id` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_rewards_for(&self, character_id: CharacterId) {
        self.failures
            .lock()
            .unwrap()
            .reward_characters
            .insert(character_id);
    }

    /// Makes catalog resolution of `name` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_catalog_item(&self, name: &str) {
        self.failures
            .lock()
            .unwrap()
            .reward_items
            .insert(name.to_owned());
    }

    fn reward_write_fails(&self, character_id: CharacterId) -> bool {
        self.failures
            .lock()
            .unwrap()
            .reward_characters
            .contains(&character_id)
    }

    fn check_reads(&self) -> Result<(), DomainError> {
        if self.failures.lock().unwrap().reads {
            return Err(injected());
        }
        Ok(())
    }

    // --- inspection ---

    /// All sessions of a campaign, ordered by number.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sessions(&self, campaign_id: CampaignId) -> Vec<Session> {
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<Session> = state
            .sessions
            .iter()
            .filter(|s| s.campaign_id == campaign_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_number);
        sessions
    }

    /// The campaign row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn campaign(&self, campaign_id: CampaignId) -> Option<Campaign> {
        self.state.lock().unwrap().campaigns.get(&campaign_id).cloned()
    }

    /// `(item name, quantity, equipped)` for every inventory row of a
    /// character, ordered by item name.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn inventory(&self, character_id: CharacterId) -> Vec<(String, i32, bool)> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<(String, i32, bool)> = state
            .inventory
            .iter()
            .filter(|((owner, _), _)| *owner == character_id)
            .filter_map(|((_, item_id), row)| {
                state
                    .catalog
                    .iter()
                    .find(|c| c.id == *item_id)
                    .map(|c| (c.spec.name.clone(), row.quantity, row.equipped))
            })
            .collect();
        rows.sort();
        rows
    }

    /// Number of catalog rows carrying exactly `name`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn catalog_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .catalog
            .iter()
            .filter(|c| c.spec.name == name)
            .count()
    }

    /// Ledger entries of a character in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn ledger(&self, character_id: CharacterId) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .unwrap()
            .ledger
            .iter()
            .filter(|e| e.character_id == character_id)
            .cloned()
            .collect()
    }

    /// Character ids of a campaign's active participants, in roster order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn active_roster_ids(&self, campaign_id: CampaignId) -> Vec<CharacterId> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<(Option<i32>, CharacterId)> = state
            .participants
            .iter()
            .filter(|p| p.campaign_id == campaign_id && p.is_active)
            .map(|p| (p.turn_order, p.character_id))
            .collect();
        rows.sort_by_key(|(turn_order, id)| (turn_order.is_none(), *turn_order, *id));
        rows.into_iter().map(|(_, id)| id).collect()
    }

    /// Experience total of a character.
    ///
    /// # Panics
    ///
    /// Panics if the character does not exist or the mutex is poisoned.
    pub fn experience(&self, character_id: CharacterId) -> i64 {
        self.state.lock().unwrap().characters[&character_id].experience
    }
}

#[async_trait]
impl CampaignReader for InMemoryStore {
    async fn find_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, DomainError> {
        self.check_reads()?;
        Ok(self.campaign(campaign_id))
    }

    async fn latest_session(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Session>, DomainError> {
        self.check_reads()?;
        Ok(self.sessions(campaign_id).pop())
    }

    async fn active_roster(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<RosterEntry>, DomainError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        let mut roster: Vec<RosterEntry> = state
            .participants
            .iter()
            .filter(|p| p.campaign_id == campaign_id && p.is_active)
            .filter_map(|p| {
                state.characters.get(&p.character_id).map(|c| RosterEntry {
                    character_id: p.character_id,
                    user_id: p.user_id,
                    name: c.name.clone(),
                    race: c.race.clone(),
                    class_name: c.class_name.clone(),
                    level: c.level,
                    turn_order: p.turn_order,
                })
            })
            .collect();
        roster.sort_by_key(|r| (r.turn_order.is_none(), r.turn_order, r.character_id));
        Ok(roster)
    }

    async fn latest_roll(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<DiceRollFact>, DomainError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .rolls
            .iter()
            .filter(|(owner, _)| *owner == campaign_id)
            .map(|(_, roll)| roll)
            .max_by_key(|roll| roll.rolled_at)
            .cloned())
    }
}

#[async_trait]
impl RewardStore for InMemoryStore {
    async fn upsert_catalog_item(&self, item: &CatalogItemSpec) -> Result<ItemId, DomainError> {
        if self.failures.lock().unwrap().reward_items.contains(&item.name) {
            return Err(injected());
        }
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.catalog.iter().find(|c| c.spec.name == item.name) {
            return Ok(existing.id);
        }
        let id = ItemId(state.allocate_id());
        state.catalog.push(CatalogRow {
            id,
            spec: item.clone(),
        });
        Ok(id)
    }

    async fn grant_item(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> Result<i32, DomainError> {
        if self.reward_write_fails(character_id) {
            return Err(injected());
        }
        let mut state = self.state.lock().unwrap();
        state.character_mut(character_id)?;
        let row = state
            .inventory
            .entry((character_id, item_id))
            .and_modify(|row| row.quantity += 1)
            .or_insert(InventoryRow {
                quantity: 1,
                equipped: false,
            });
        Ok(row.quantity)
    }

    async fn apply_currency_delta(
        &self,
        character_id: CharacterId,
        delta_copper: i64,
        reason: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<Purse, DomainError> {
        if self.reward_write_fails(character_id) {
            return Err(injected());
        }
        let mut state = self.state.lock().unwrap();
        let character = state.character_mut(character_id)?;
        let purse = character.purse.credit(delta_copper)?;
        character.purse = purse;
        state.ledger.push(LedgerEntry {
            character_id,
            delta_copper,
            reason: reason.to_owned(),
            recorded_at,
        });
        Ok(purse)
    }

    async fn add_experience(
        &self,
        character_id: CharacterId,
        amount: i64,
    ) -> Result<i64, DomainError> {
        if self.reward_write_fails(character_id) {
            return Err(injected());
        }
        let mut state = self.state.lock().unwrap();
        let character = state.character_mut(character_id)?;
        character.experience += amount;
        Ok(character.experience)
    }

    async fn purse(&self, character_id: CharacterId) -> Result<Purse, DomainError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.character_mut(character_id)?.purse)
    }

    async fn ledger_total(&self, character_id: CharacterId) -> Result<i64, DomainError> {
        Ok(self
            .ledger(character_id)
            .iter()
            .map(|e| e.delta_copper)
            .sum())
    }
}

#[derive(Debug)]
enum StagedWrite {
    Complete(i32, DateTime<Utc>),
    Insert(Session),
    Pointer(i32),
}

/// Buffers writes until commit while holding the store's write lock.
struct InMemorySessionTransaction {
    campaign_id: CampaignId,
    state: Arc<Mutex<StoreState>>,
    fail_writes: bool,
    staged: Vec<StagedWrite>,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl SessionTransaction for InMemorySessionTransaction {
    async fn latest_session_number(&mut self) -> Result<Option<i32>, DomainError> {
        let committed = self
            .state
            .lock()
            .unwrap()
            .latest_session_number(self.campaign_id);
        let staged = self.staged.iter().filter_map(|w| match w {
            StagedWrite::Insert(s) => Some(s.session_number),
            _ => None,
        });
        Ok(committed.into_iter().chain(staged).max())
    }

    async fn complete_session(
        &mut self,
        session_number: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.staged
            .push(StagedWrite::Complete(session_number, completed_at));
        Ok(())
    }

    async fn insert_session(&mut self, session: &NewSession) -> Result<Session, DomainError> {
        if self.fail_writes {
            return Err(injected());
        }
        if self.latest_session_number().await? >= Some(session.session_number) {
            return Err(DomainError::Conflict(format!(
                "session {} already exists for campaign {}",
                session.session_number, session.campaign_id
            )));
        }
        let id = SessionId(self.state.lock().unwrap().allocate_id());
        let row = Session {
            id,
            campaign_id: session.campaign_id,
            session_number: session.session_number,
            title: session.title.clone(),
            narrative: session.narrative.clone(),
            location: session.location.clone(),
            choices: session.choices.clone(),
            experience_reward: session.experience_reward,
            is_completed: false,
            completed_at: None,
            created_at: session.created_at,
        };
        self.staged.push(StagedWrite::Insert(row.clone()));
        Ok(row)
    }

    async fn set_current_session(&mut self, session_number: i32) -> Result<(), DomainError> {
        self.staged.push(StagedWrite::Pointer(session_number));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        let campaign_id = this.campaign_id;
        let mut state = this.state.lock().unwrap();
        for write in this.staged {
            match write {
                StagedWrite::Complete(number, at) => {
                    if let Some(session) = state
                        .sessions
                        .iter_mut()
                        .find(|s| s.campaign_id == campaign_id && s.session_number == number)
                    {
                        session.is_completed = true;
                        session.completed_at = Some(at);
                    }
                }
                StagedWrite::Insert(session) => state.sessions.push(session),
                StagedWrite::Pointer(number) => {
                    if let Some(campaign) = state.campaigns.get_mut(&campaign_id) {
                        campaign.current_session = number;
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn begin_advance(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Box<dyn SessionTransaction>, DomainError> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        if self.campaign(campaign_id).is_none() {
            return Err(DomainError::not_found("campaign", campaign_id));
        }
        Ok(Box::new(InMemorySessionTransaction {
            campaign_id,
            state: Arc::clone(&self.state),
            fail_writes: self.failures.lock().unwrap().session_writes,
            staged: Vec::new(),
            _guard: guard,
        }))
    }

    async fn find_session(
        &self,
        campaign_id: CampaignId,
        session_number: i32,
    ) -> Result<Option<Session>, DomainError> {
        self.check_reads()?;
        Ok(self
            .sessions(campaign_id)
            .into_iter()
            .find(|s| s.session_number == session_number))
    }
}
