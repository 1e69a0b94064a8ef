//! Reward settlement domain.

pub mod commands;
pub mod settlement;
