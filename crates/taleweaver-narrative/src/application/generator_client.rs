//! Narrative Generator Client.
//!
//! The only caller of the [`TextGenerator`] port. Sends one request per
//! advancement and hands back either a validated [`GeneratedSession`] or a
//! typed failure. It never retries.

use std::sync::Arc;

use taleweaver_core::generation::{GenerationError, GenerationRequest, TextGenerator};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::context::ContextBundle;
use crate::domain::contract::{
    ContractViolation, GeneratedSession, SCHEMA_NAME, parse_generation, response_schema,
};
use crate::domain::prompt::{SYSTEM_PROMPT, render_user_prompt};

/// Why no usable session came back from the narrator.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// The model could not be reached or did not answer.
    #[error("narrator unavailable: {0}")]
    Unavailable(#[from] GenerationError),

    /// The model answered with something that breaks the contract.
    #[error("narrator output rejected: {0}")]
    Malformed(#[from] ContractViolation),
}

/// Wraps a text generator with the session contract.
#[derive(Clone)]
pub struct NarrativeGeneratorClient {
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for NarrativeGeneratorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeGeneratorClient").finish_non_exhaustive()
    }
}

impl NarrativeGeneratorClient {
    /// Creates a client over `generator`.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Builds the request for one advancement.
    #[must_use]
    pub fn build_request(context: &ContextBundle, action: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_owned(),
            user_prompt: render_user_prompt(context, action),
            schema_name: SCHEMA_NAME,
            response_schema: response_schema(),
        }
    }

    /// Asks the narrator for the next session and validates the answer.
    ///
    /// # Errors
    ///
    /// Returns `NarrationError::Unavailable` if the generator fails and
    /// `NarrationError::Malformed` if its output violates the contract. The
    /// raw output of a rejected response is logged, never returned.
    pub async fn generate(
        &self,
        context: &ContextBundle,
        action: &str,
    ) -> Result<GeneratedSession, NarrationError> {
        let request = Self::build_request(context, action);
        let response = self.generator.generate(&request).await?;
        info!(
            campaign_id = %context.campaign_id,
            model = %response.model,
            bytes = response.text.len(),
            "narrator responded"
        );

        parse_generation(&response.text).map_err(|violation| {
            warn!(
                campaign_id = %context.campaign_id,
                %violation,
                raw_output = %response.text,
                "narrator output failed validation"
            );
            NarrationError::Malformed(violation)
        })
    }
}
