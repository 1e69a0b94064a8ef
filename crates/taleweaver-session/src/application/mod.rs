//! Session & advancement application services.

pub mod campaign_locks;
pub mod orchestrator;
pub mod session_persistence;
