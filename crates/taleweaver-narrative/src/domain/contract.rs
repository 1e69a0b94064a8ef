//! The structured output contract the narrator must honour.
//!
//! Model output is untrusted. [`parse_generation`] accepts a response only if
//! every required field is present, well typed and consistent; otherwise it
//! returns a [`ContractViolation`] and nothing from the response is used.

use serde::Deserialize;
use serde_json::{Value, json};
use taleweaver_core::campaign::Choice;
use taleweaver_core::reward::RewardDescriptor;
use thiserror::Error;

/// Name the output schema is registered under.
pub const SCHEMA_NAME: &str = "adventure_session";

/// Every session offers exactly this many choices.
pub const CHOICE_COUNT: usize = 4;

/// Dice a choice may ask for.
pub const SUPPORTED_DICE: [&str; 7] = ["d4", "d6", "d8", "d10", "d12", "d20", "d100"];

/// A narrator response that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSession {
    /// Narrative text of the new session.
    pub narrative: String,
    /// Title of the new session.
    pub session_title: String,
    /// Where the new session takes place.
    pub location: String,
    /// Party-wide rewards.
    pub rewards: Vec<RewardDescriptor>,
    /// Exactly four follow-up choices.
    pub choices: Vec<Choice>,
}

/// Why a narrator response was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// Not JSON, or a required field is missing or mistyped.
    #[error("response does not match the session schema: {0}")]
    Schema(String),

    /// A required text field is empty.
    #[error("field `{0}` must not be blank")]
    BlankField(&'static str),

    /// Wrong number of choices.
    #[error("expected exactly 4 choices, got {0}")]
    ChoiceCount(usize),

    /// A choice's roll fields disagree with `requiresDiceRoll`.
    #[error("choice {index}: {reason}")]
    Choice {
        /// Zero-based position of the offending choice.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeneration {
    narrative: String,
    session_title: String,
    location: String,
    #[serde(default)]
    rewards: Vec<RewardDescriptor>,
    choices: Vec<Choice>,
}

/// Strips one surrounding Markdown code fence, which some models add even
/// when asked for bare JSON.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`), which may share a line with the body.
    body.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim()
}

fn validate_choice(index: usize, choice: &mut Choice) -> Result<(), ContractViolation> {
    let violation = |reason: &str| ContractViolation::Choice {
        index,
        reason: reason.to_owned(),
    };

    if choice.action.trim().is_empty() {
        return Err(violation("`action` must not be blank"));
    }

    if choice.requires_dice_roll {
        match choice.dice_type.as_deref() {
            None => return Err(violation("`diceType` is required when a roll is required")),
            Some(dice) if !SUPPORTED_DICE.contains(&dice) => {
                return Err(violation(&format!("unsupported `diceType` {dice:?}")));
            }
            Some(_) => {}
        }
        match choice.roll_dc {
            None => return Err(violation("`rollDC` is required when a roll is required")),
            Some(dc) if dc < 1 => return Err(violation("`rollDC` must be positive")),
            Some(_) => {}
        }
        if choice
            .roll_purpose
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
        {
            return Err(violation("`rollPurpose` is required when a roll is required"));
        }
        choice.roll_modifier.get_or_insert(0);
    } else if choice.dice_type.is_some()
        || choice.roll_dc.is_some()
        || choice.roll_modifier.is_some()
        || choice.roll_purpose.is_some()
        || choice.success_text.is_some()
        || choice.failure_text.is_some()
    {
        return Err(violation(
            "roll fields are only allowed when `requiresDiceRoll` is true",
        ));
    }
    Ok(())
}

/// Parses and validates a narrator response.
///
/// # Errors
///
/// Returns a [`ContractViolation`] describing the first problem found.
pub fn parse_generation(text: &str) -> Result<GeneratedSession, ContractViolation> {
    let raw: RawGeneration = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ContractViolation::Schema(e.to_string()))?;

    if raw.narrative.trim().is_empty() {
        return Err(ContractViolation::BlankField("narrative"));
    }
    if raw.session_title.trim().is_empty() {
        return Err(ContractViolation::BlankField("sessionTitle"));
    }
    if raw.choices.len() != CHOICE_COUNT {
        return Err(ContractViolation::ChoiceCount(raw.choices.len()));
    }
    if let Some(index) = raw.rewards.iter().position(|r| r.name.trim().is_empty()) {
        return Err(ContractViolation::Schema(format!(
            "reward {index} has a blank `name`"
        )));
    }

    let mut choices = raw.choices;
    for (index, choice) in choices.iter_mut().enumerate() {
        validate_choice(index, choice)?;
    }

    Ok(GeneratedSession {
        narrative: raw.narrative,
        session_title: raw.session_title,
        location: raw.location,
        rewards: raw.rewards,
        choices,
    })
}

/// Schema for a field the model may leave out; strict structured output
/// expresses that as a required, nullable property.
fn nullable(kind: &str) -> Value {
    json!({ "type": [kind, "null"] })
}

/// JSON schema sent with every generation request.
///
/// Every object closes `additionalProperties` and lists all of its
/// properties as required, as strict structured-output mode demands.
#[must_use]
pub fn response_schema() -> Value {
    let mut dice: Vec<Value> = SUPPORTED_DICE.iter().map(|d| json!(d)).collect();
    dice.push(Value::Null);

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "narrative": { "type": "string" },
            "sessionTitle": { "type": "string" },
            "location": { "type": "string" },
            "rewards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "kind": { "type": "string", "enum": ["currency", "item", "experience"] },
                        "name": { "type": "string" },
                        "description": { "type": "string" },
                        "value": { "type": "integer" },
                        "rarity": nullable("string")
                    },
                    "required": ["kind", "name", "description", "value", "rarity"]
                }
            },
            "choices": {
                "type": "array",
                "minItems": CHOICE_COUNT,
                "maxItems": CHOICE_COUNT,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "action": { "type": "string" },
                        "description": { "type": "string" },
                        "icon": { "type": "string" },
                        "requiresDiceRoll": { "type": "boolean" },
                        "diceType": { "type": ["string", "null"], "enum": dice },
                        "rollDC": nullable("integer"),
                        "rollModifier": nullable("integer"),
                        "rollPurpose": nullable("string"),
                        "successText": nullable("string"),
                        "failureText": nullable("string")
                    },
                    "required": [
                        "action", "description", "icon", "requiresDiceRoll", "diceType",
                        "rollDC", "rollModifier", "rollPurpose", "successText", "failureText"
                    ]
                }
            }
        },
        "required": ["narrative", "sessionTitle", "location", "rewards", "choices"]
    })
}
