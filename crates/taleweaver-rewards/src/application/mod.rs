//! Reward settlement application services.

pub mod command_handlers;
