//! Narrative domain: context bundle, prompt and output contract.

pub mod context;
pub mod contract;
pub mod prompt;
