//! Taleweaver — narrator client.
//!
//! Implements the `TextGenerator` port against any service that speaks the
//! OpenAI chat-completions protocol (Ollama, vLLM, OpenAI itself).

pub mod client;
mod wire;

pub use client::{ChatCompletionsClient, NarratorSettings};
