//! Row shapes read with `sqlx::FromRow`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use taleweaver_core::campaign::{Campaign, Choice, DiceRollFact, RosterEntry, Session};
use taleweaver_core::ids::{CampaignId, CharacterId, SessionId, UserId};
use taleweaver_core::reward::Purse;

pub(crate) const SESSION_COLUMNS: &str = "id, campaign_id, session_number, title, narrative, \
     location, choices, experience_reward, is_completed, completed_at, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct CampaignRow {
    id: i64,
    title: String,
    description: String,
    current_session: i32,
    current_turn_user_id: Option<i64>,
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Self {
        Self {
            id: CampaignId(row.id),
            title: row.title,
            description: row.description,
            current_session: row.current_session,
            current_turn_user_id: row.current_turn_user_id.map(UserId),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SessionRow {
    id: i64,
    campaign_id: i64,
    session_number: i32,
    title: String,
    narrative: String,
    location: String,
    choices: Json<Vec<Choice>>,
    experience_reward: i64,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId(row.id),
            campaign_id: CampaignId(row.campaign_id),
            session_number: row.session_number,
            title: row.title,
            narrative: row.narrative,
            location: row.location,
            choices: row.choices.0,
            experience_reward: row.experience_reward,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RosterRow {
    character_id: i64,
    user_id: i64,
    name: String,
    race: String,
    class_name: String,
    level: i32,
    turn_order: Option<i32>,
}

impl From<RosterRow> for RosterEntry {
    fn from(row: RosterRow) -> Self {
        Self {
            character_id: CharacterId(row.character_id),
            user_id: UserId(row.user_id),
            name: row.name,
            race: row.race,
            class_name: row.class_name,
            level: row.level,
            turn_order: row.turn_order,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct DiceRollRow {
    dice_type: String,
    result: i32,
    modifier: i32,
    purpose: Option<String>,
    rolled_at: DateTime<Utc>,
}

impl From<DiceRollRow> for DiceRollFact {
    fn from(row: DiceRollRow) -> Self {
        Self {
            dice_type: row.dice_type,
            result: row.result,
            modifier: row.modifier,
            purpose: row.purpose,
            rolled_at: row.rolled_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PurseRow {
    pub(crate) gold: i64,
    pub(crate) silver: i64,
    pub(crate) copper: i64,
}

impl From<PurseRow> for Purse {
    fn from(row: PurseRow) -> Self {
        Self {
            gold: row.gold,
            silver: row.silver,
            copper: row.copper,
        }
    }
}
