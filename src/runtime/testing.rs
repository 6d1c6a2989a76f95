//! Mock implementations for testing
//!
//! These mocks enable session and API tests without a remote model.

use crate::gateway::{Completion, CompletionGateway, GatewayError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Mock gateway that returns queued results in order
pub struct MockGateway {
    results: Mutex<VecDeque<Result<Completion, GatewayError>>>,
    /// Record of every user text sent
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Wait this long before answering each call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful reply with no usage
    pub fn queue_reply(&self, text: &str) {
        self.queue_completion(text, 0);
    }

    /// Queue a successful reply with reported usage
    pub fn queue_completion(&self, text: &str, tokens_used: u64) {
        self.results.lock().unwrap().push_back(Ok(Completion {
            text: text.to_string(),
            tokens_used,
        }));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: GatewayError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded prompts
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(&self, user_text: &str) -> Result<Completion, GatewayError> {
        self.prompts.lock().unwrap().push(user_text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("No mock response queued".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_drains_queue_then_fails() {
        let mock = MockGateway::new();
        mock.queue_reply("Hello");

        assert_eq!(mock.complete("hi").await.unwrap().text, "Hello");
        assert!(mock.complete("again").await.is_err());
        assert_eq!(mock.recorded_prompts(), vec!["hi", "again"]);
    }
}
