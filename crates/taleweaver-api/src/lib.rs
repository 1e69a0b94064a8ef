//! Taleweaver — HTTP API.
//!
//! Exposes campaign advancement over JSON and wires the storage, narrator
//! and orchestration crates together.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
