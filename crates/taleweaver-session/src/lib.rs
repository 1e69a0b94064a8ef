//! Taleweaver — Session & advancement context.
//!
//! Owns the unit of work that turns a player's action into the next
//! session: context, narration, validation, reward settlement, and the
//! durable move of the campaign's session pointer.

pub mod application;
pub mod domain;
