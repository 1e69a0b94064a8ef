//! Narrator output fixtures.

use serde_json::{Value, json};

/// A choice that needs no dice roll.
#[must_use]
pub fn plain_choice(action: &str) -> Value {
    json!({
        "action": action,
        "description": format!("You decide to {}.", action.to_lowercase()),
        "icon": "compass",
        "requiresDiceRoll": false
    })
}

/// A choice gated by a d20 check.
#[must_use]
pub fn dice_choice(action: &str, purpose: &str, dc: i32) -> Value {
    json!({
        "action": action,
        "description": format!("Attempt to {}.", action.to_lowercase()),
        "icon": "dice",
        "requiresDiceRoll": true,
        "diceType": "d20",
        "rollDC": dc,
        "rollModifier": 2,
        "rollPurpose": purpose,
        "successText": "It works.",
        "failureText": "It does not work."
    })
}

/// Four well-formed choices, one of them with a roll.
#[must_use]
pub fn four_choices() -> Value {
    json!([
        plain_choice("Open the door"),
        dice_choice("Pick the lock", "Sleight of Hand", 14),
        plain_choice("Question the barkeep"),
        plain_choice("Leave the tavern"),
    ])
}

/// Serialized narrator output with the given title, location and rewards
/// and the standard four choices.
#[must_use]
pub fn generation_json(title: &str, location: &str, rewards: &Value) -> String {
    json!({
        "narrative": format!("The party presses on. {title} awaits in {location}."),
        "sessionTitle": title,
        "location": location,
        "rewards": rewards,
        "choices": four_choices(),
    })
    .to_string()
}
