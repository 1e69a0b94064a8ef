//! Port to the external generative text service.

use async_trait::async_trait;
use thiserror::Error;

/// One structured-output request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Instructions framing the model as narrator.
    pub system_prompt: String,
    /// The campaign context and player action.
    pub user_prompt: String,
    /// Name the schema is registered under in the request.
    pub schema_name: &'static str,
    /// JSON schema the output must conform to.
    pub response_schema: serde_json::Value,
}

/// Raw model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Text content of the first completion.
    pub text: String,
    /// Model that produced it, as reported by the service.
    pub model: String,
}

/// Failure to obtain any response from the model.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request never completed (DNS, TLS, connection reset, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service did not answer within the deadline.
    #[error("request timed out")]
    Timeout,

    /// The service throttled the request.
    #[error("rate limited by generation service")]
    RateLimited,

    /// The service answered with a non-success status.
    #[error("generation service returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for logs.
        body: String,
    },

    /// The service answered but carried no completion text.
    #[error("generation service returned no content")]
    EmptyResponse,
}

/// A generative text service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one request. Implementations must not retry.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}
