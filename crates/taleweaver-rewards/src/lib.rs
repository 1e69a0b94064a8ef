//! Taleweaver — Reward settlement context.
//!
//! Applies narrator rewards to every active character in a campaign: coins
//! with an audit ledger, catalog items into inventories, and experience.
//! Settlement is best-effort per character and reward; the report says
//! exactly which pairs applied.

pub mod application;
pub mod domain;
