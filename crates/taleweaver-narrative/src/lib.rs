//! Taleweaver — Narrative context.
//!
//! Builds the context bundle a narrator needs, turns it into a prompt,
//! calls the text generator once and accepts the answer only if it honours
//! the session contract exactly.

pub mod application;
pub mod domain;
