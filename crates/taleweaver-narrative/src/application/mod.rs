//! Narrative application services.

pub mod context_assembler;
pub mod generator_client;
