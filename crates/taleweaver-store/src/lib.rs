//! Taleweaver — `PostgreSQL` storage.
//!
//! Implements the campaign, reward and session ports from
//! `taleweaver-core` on top of a `sqlx` connection pool.

pub mod pg_campaign_reader;
pub mod pg_reward_store;
pub mod pg_session_store;
pub mod pg_store;
mod rows;

pub use pg_store::{MIGRATOR, PgStore};
