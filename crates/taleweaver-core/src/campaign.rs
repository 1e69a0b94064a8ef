//! Campaign, session and party records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CampaignId, CharacterId, SessionId, UserId};

/// A campaign as seen by the advancement engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Campaign identifier.
    pub id: CampaignId,
    /// Display title.
    pub title: String,
    /// Free-text premise.
    pub description: String,
    /// Number of the most recent persisted session (0 before the first one).
    pub current_session: i32,
    /// The user whose turn it currently is, if turn order is tracked.
    pub current_turn_user_id: Option<UserId>,
}

/// One of the four follow-up actions offered at the end of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Short imperative label.
    pub action: String,
    /// What taking this action means in the story.
    pub description: String,
    /// Icon hint for the client.
    pub icon: String,
    /// Whether a dice check gates the outcome.
    pub requires_dice_roll: bool,
    /// Die to roll, e.g. `d20`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice_type: Option<String>,
    /// Difficulty class to beat.
    #[serde(rename = "rollDC", default, skip_serializing_if = "Option::is_none")]
    pub roll_dc: Option<i32>,
    /// Flat modifier added to the roll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_modifier: Option<i32>,
    /// What the roll is for, e.g. `Perception`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_purpose: Option<String>,
    /// Narration on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_text: Option<String>,
    /// Narration on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_text: Option<String>,
}

/// A persisted narrative session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Row identifier.
    pub id: SessionId,
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Sequence number, unique within the campaign and starting at 1.
    pub session_number: i32,
    /// Session title.
    pub title: String,
    /// Narrative text.
    pub narrative: String,
    /// Where the party is.
    pub location: String,
    /// Follow-up choices.
    pub choices: Vec<Choice>,
    /// Experience awarded for reaching this session.
    pub experience_reward: i64,
    /// Set once the party has moved past this session.
    pub is_completed: bool,
    /// When the session was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

/// Values for a session row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Sequence number assigned by the persistence manager.
    pub session_number: i32,
    /// Session title.
    pub title: String,
    /// Narrative text.
    pub narrative: String,
    /// Where the party is.
    pub location: String,
    /// Follow-up choices.
    pub choices: Vec<Choice>,
    /// Experience awarded for reaching this session.
    pub experience_reward: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An active participant's character, as listed in the party roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// The character.
    pub character_id: CharacterId,
    /// The controlling user.
    pub user_id: UserId,
    /// Character name.
    pub name: String,
    /// Character race.
    pub race: String,
    /// Character class.
    pub class_name: String,
    /// Character level.
    pub level: i32,
    /// Position in turn order, if assigned.
    pub turn_order: Option<i32>,
}

/// The most recent dice roll recorded for a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRollFact {
    /// Die notation, e.g. `d20`.
    pub dice_type: String,
    /// Natural result shown on the die.
    pub result: i32,
    /// Modifier applied on top.
    pub modifier: i32,
    /// Why the roll was made.
    pub purpose: Option<String>,
    /// When it was rolled.
    pub rolled_at: DateTime<Utc>,
}

impl DiceRollFact {
    /// Natural result plus modifier.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.result + self.modifier
    }
}
