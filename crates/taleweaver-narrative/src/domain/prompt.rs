//! Prompt rendering.

use std::fmt::Write;

use super::context::ContextBundle;

/// Frames the model as the campaign's narrator.
pub const SYSTEM_PROMPT: &str = "You are the narrator of a tabletop role-playing campaign. \
Continue the story from the player's action in second person, keep the party's established \
facts consistent, and end the session with exactly four distinct choices. Offer rewards only \
when the story earns them: currency values are in copper pieces, item rewards name a single \
object, experience rewards are points. Roll fields are null unless a choice requires a \
dice roll. Answer with a single JSON object that matches the \
provided schema and nothing else.";

/// Renders the user prompt for one advancement.
#[must_use]
pub fn render_user_prompt(context: &ContextBundle, action: &str) -> String {
    let mut prompt = String::new();
    let session = &context.current_session;

    // Writing to a String cannot fail.
    let _ = writeln!(prompt, "CAMPAIGN: {}", context.campaign_title);
    if !context.campaign_description.trim().is_empty() {
        let _ = writeln!(prompt, "PREMISE: {}", context.campaign_description);
    }

    prompt.push_str("\nPARTY:\n");
    if context.roster.is_empty() {
        prompt.push_str("- (no active characters)\n");
    }
    for member in &context.roster {
        let _ = writeln!(
            prompt,
            "- {}, level {} {} {}",
            member.name, member.level, member.race, member.class_name
        );
    }

    let _ = writeln!(
        prompt,
        "\nCURRENT SESSION #{}: {}\nLOCATION: {}\n{}",
        session.number, session.title, session.location, session.narrative
    );

    if !session.choices.is_empty() {
        prompt.push_str("\nCHOICES THAT WERE OFFERED:\n");
        for choice in &session.choices {
            let _ = writeln!(prompt, "- {}: {}", choice.action, choice.description);
        }
    }

    if let Some(roll) = &context.last_roll {
        let _ = writeln!(prompt, "\nMOST RECENT ROLL: {roll}");
    }

    let _ = write!(
        prompt,
        "\nPLAYER ACTION: {}\n\nWrite session #{}.",
        action.trim(),
        session.number + 1
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::SessionSnapshot;
    use taleweaver_core::campaign::RosterEntry;
    use taleweaver_core::ids::{CampaignId, CharacterId, UserId};

    fn bundle(last_roll: Option<String>) -> ContextBundle {
        ContextBundle {
            campaign_id: CampaignId(1),
            campaign_title: "The Sunken Crown".to_owned(),
            campaign_description: "A drowned kingdom stirs.".to_owned(),
            roster: vec![RosterEntry {
                character_id: CharacterId(10),
                user_id: UserId(100),
                name: "Mira".to_owned(),
                race: "Elf".to_owned(),
                class_name: "Rogue".to_owned(),
                level: 3,
                turn_order: Some(1),
            }],
            current_session: SessionSnapshot {
                number: 1,
                title: "The Tavern".to_owned(),
                narrative: "Rain drums on the shutters.".to_owned(),
                location: "The Tavern".to_owned(),
                choices: Vec::new(),
            },
            last_roll,
        }
    }

    #[test]
    fn test_prompt_includes_party_session_and_action() {
        let prompt = render_user_prompt(&bundle(None), "  search the room ");

        assert!(prompt.contains("CAMPAIGN: The Sunken Crown"));
        assert!(prompt.contains("- Mira, level 3 Elf Rogue"));
        assert!(prompt.contains("CURRENT SESSION #1: The Tavern"));
        assert!(prompt.contains("PLAYER ACTION: search the room\n"));
        assert!(prompt.ends_with("Write session #2."));
        assert!(!prompt.contains("MOST RECENT ROLL"));
    }

    #[test]
    fn test_prompt_includes_last_roll_when_present() {
        let prompt = render_user_prompt(
            &bundle(Some("d20 roll for Perception: rolled 20 + 0 = 20".to_owned())),
            "look around",
        );

        assert!(prompt.contains("MOST RECENT ROLL: d20 roll for Perception"));
    }
}
