//! Chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use taleweaver_core::generation::{
    GenerationError, GenerationRequest, GenerationResponse, TextGenerator,
};
use tracing::{debug, instrument};

use crate::wire::{
    ChatMessage, ChatRequest, ChatResponse, JsonSchemaFormat, ResponseFormat,
};

/// Default narrator base URL (a local Ollama).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default narrator model.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Longest error body kept for logs.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the narrator service.
#[derive(Debug, Clone, PartialEq)]
pub struct NarratorSettings {
    /// Service root, without the `/v1/...` path.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Bearer token, if the service needs one.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Transport-level deadline for one request.
    pub request_timeout: Duration,
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
            temperature: 0.8,
            max_tokens: 2048,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    settings: NarratorSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Builds a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Transport` if the HTTP client cannot be
    /// built (for example when no TLS backend is available).
    pub fn new(mut settings: NarratorSettings) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        settings.base_url = settings.base_url.trim_end_matches('/').to_owned();
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.settings.base_url)
    }
}

fn transport_error(error: &reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport(error.to_string())
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

fn convert_response(
    response: ChatResponse,
    fallback_model: &str,
) -> Result<GenerationResponse, GenerationError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)?;

    Ok(GenerationResponse {
        text,
        model: response
            .model
            .unwrap_or_else(|| fallback_model.to_owned()),
    })
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.settings.model, schema = request.schema_name))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.schema_name,
                    strict: true,
                    schema: &request.response_schema,
                },
            },
        };

        let mut call = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.settings.api_key {
            call = call.bearer_auth(key);
        }
        let response = call.send().await.map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::Transport(format!("invalid completion body: {e}"))
            }
        })?;
        let result = convert_response(parsed, &self.settings.model)?;
        debug!(model = %result.model, bytes = result.text.len(), "completion received");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Serves `/v1/chat/completions` with a fixed status and body, recording
    /// every request's bearer header and JSON body.
    async fn spawn_service(status: u16, reply: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_owned);
                            captured.lock().unwrap().push((auth, body));
                            (AxumStatus::from_u16(status).unwrap(), Json(reply))
                        }
                    },
                ),
            )
            .with_state(Arc::clone(&captured));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), captured)
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_prompt: "You are the narrator.".to_owned(),
            user_prompt: "PLAYER ACTION: search the room".to_owned(),
            schema_name: "adventure_session",
            response_schema: json!({"type": "object"}),
        }
    }

    fn client(base_url: String, api_key: Option<&str>) -> ChatCompletionsClient {
        ChatCompletionsClient::new(NarratorSettings {
            base_url,
            api_key: api_key.map(str::to_owned),
            ..NarratorSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_schema_and_returns_content() {
        // Arrange
        let (base_url, captured) = spawn_service(
            200,
            json!({
                "model": "llama3.1:8b",
                "choices": [{"message": {"role": "assistant", "content": "{\"narrative\":\"...\"}"}}]
            }),
        )
        .await;

        // Act
        let response = client(base_url, Some("secret"))
            .generate(&request())
            .await
            .unwrap();

        // Assert
        assert_eq!(response.text, "{\"narrative\":\"...\"}");
        assert_eq!(response.model, "llama3.1:8b");
        let captured = captured.lock().unwrap();
        let (auth, body) = &captured[0];
        assert_eq!(auth.as_deref(), Some("Bearer secret"));
        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "PLAYER ACTION: search the room");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "adventure_session");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["max_tokens"], 2048);
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let (base_url, _) = spawn_service(429, json!({"error": "slow down"})).await;

        let result = client(base_url, None).generate(&request()).await;

        assert!(matches!(result, Err(GenerationError::RateLimited)));
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let (base_url, captured) = spawn_service(503, json!({"error": "loading model"})).await;

        let result = client(base_url, None).generate(&request()).await;

        match result {
            Err(GenerationError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("loading model"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(captured.lock().unwrap()[0].0, None);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let result = client("http://127.0.0.1:9".to_owned(), None)
            .generate(&request())
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::Transport(_) | GenerationError::Timeout)
        ));
    }

    #[test]
    fn test_missing_content_is_empty_response() {
        let response: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "  "}}]})).unwrap();

        let result = convert_response(response, "llama3.1");

        assert!(matches!(result, Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn test_model_falls_back_to_configured_name() {
        let response: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "{}"}}]})).unwrap();

        let result = convert_response(response, "llama3.1").unwrap();

        assert_eq!(result.model, "llama3.1");
    }

    #[test]
    fn test_long_error_bodies_are_truncated() {
        assert_eq!(truncate("é".repeat(400)).len(), MAX_ERROR_BODY);
    }
}
