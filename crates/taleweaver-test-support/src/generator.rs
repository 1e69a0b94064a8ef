//! Test doubles for the `TextGenerator` port.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use taleweaver_core::generation::{
    GenerationError, GenerationRequest, GenerationResponse, TextGenerator,
};

/// Replies with queued texts in order and records every request. Once the
/// queue is empty it keeps answering with the last text.
#[derive(Debug)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    /// Creates a generator that answers with `reply` every time.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self::sequence(vec![reply.into()])
    }

    /// Creates a generator that answers with each of `replies` in turn.
    #[must_use]
    pub fn sequence(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of the requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        let text = match next {
            Some(text) => {
                *last = Some(text.clone());
                text
            }
            None => last.clone().ok_or(GenerationError::EmptyResponse)?,
        };
        Ok(GenerationResponse {
            text,
            model: "scripted".to_owned(),
        })
    }
}

/// Always fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        Err(GenerationError::Transport("connection refused".into()))
    }
}

/// Never answers. Used to exercise the orchestrator's timeout.
#[derive(Debug, Default)]
pub struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        std::future::pending().await
    }
}
