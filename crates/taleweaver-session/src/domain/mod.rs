//! Session & advancement domain.

pub mod commands;
pub mod failure;
pub mod numbering;
pub mod state;
