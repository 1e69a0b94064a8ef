//! Taleweaver Core — shared domain types and ports.
//!
//! This crate defines the identifiers, records, error types and the storage
//! and text-generation traits that every bounded context depends on. It
//! contains no infrastructure code.

pub mod campaign;
pub mod clock;
pub mod command;
pub mod error;
pub mod generation;
pub mod ids;
pub mod repository;
pub mod reward;
