//! The context bundle handed to the narrator.

use taleweaver_core::campaign::{Choice, DiceRollFact, RosterEntry, Session};
use taleweaver_core::ids::CampaignId;

/// Snapshot of the session the party is currently in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session number.
    pub number: i32,
    /// Session title.
    pub title: String,
    /// Narrative text.
    pub narrative: String,
    /// Location.
    pub location: String,
    /// Choices that were offered.
    pub choices: Vec<Choice>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            number: session.session_number,
            title: session.title.clone(),
            narrative: session.narrative.clone(),
            location: session.location.clone(),
            choices: session.choices.clone(),
        }
    }
}

/// Everything the narrator is told about a campaign. Built once per
/// advancement and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBundle {
    /// Campaign being advanced.
    pub campaign_id: CampaignId,
    /// Campaign title.
    pub campaign_title: String,
    /// Campaign premise.
    pub campaign_description: String,
    /// Active party, in turn order.
    pub roster: Vec<RosterEntry>,
    /// The session being advanced from.
    pub current_session: SessionSnapshot,
    /// The latest dice roll, already rendered as text.
    pub last_roll: Option<String>,
}

/// Renders a roll for the prompt, calling out natural 20s and natural 1s on
/// a d20.
#[must_use]
pub fn describe_roll(roll: &DiceRollFact) -> String {
    let purpose = roll
        .purpose
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("an unspecified check");
    let modifier = if roll.modifier >= 0 {
        format!("+ {}", roll.modifier)
    } else {
        format!("- {}", roll.modifier.unsigned_abs())
    };
    let mut text = format!(
        "{} roll for {purpose}: rolled {} {modifier} = {}",
        roll.dice_type,
        roll.result,
        roll.total()
    );
    if roll.dice_type.eq_ignore_ascii_case("d20") {
        match roll.result {
            20 => text.push_str(" (CRITICAL SUCCESS: natural 20)"),
            1 => text.push_str(" (CRITICAL FAILURE: natural 1)"),
            _ => {}
        }
    }
    text
}
