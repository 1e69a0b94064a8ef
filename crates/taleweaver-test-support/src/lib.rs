//! Shared test doubles and fixtures for the Taleweaver adventure engine.

mod clock;
mod fixtures;
mod generator;
mod store;

pub use clock::FixedClock;
pub use fixtures::{dice_choice, four_choices, generation_json, plain_choice};
pub use generator::{FailingGenerator, ScriptedGenerator, StalledGenerator};
pub use store::InMemoryStore;
