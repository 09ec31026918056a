//! LLM client trait and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AutodocError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Whether the client has what it needs to make calls
    fn is_ready(&self) -> bool;
}

/// Mock client that replays scripted responses in order.
///
/// Every request is captured so tests can inspect the rendered prompts.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    /// Create a mock with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that returns the given texts in order
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for text in texts {
            mock.push_text(text);
        }
        mock
    }

    /// Queue a text response
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(Ok(CompletionResponse::text(text)));
    }

    /// Queue an arbitrary result (use for errors)
    pub fn push(&self, result: Result<CompletionResponse>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(result);
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .map_err(|e| AutodocError::Llm(e.to_string()))?
            .push(request);

        self.responses
            .lock()
            .map_err(|e| AutodocError::Llm(e.to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(AutodocError::Llm("mock has no scripted response left".to_string())))
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let mock = MockLlmClient::with_texts(["first", "second"]);

        let a = mock.complete(CompletionRequest::new("s")).await.unwrap();
        let b = mock.complete(CompletionRequest::new("s")).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_exhausted_is_error() {
        let mock = MockLlmClient::new();
        let result = mock.complete(CompletionRequest::new("s")).await;
        assert!(matches!(result, Err(AutodocError::Llm(_))));
    }

    #[tokio::test]
    async fn test_mock_scripted_error() {
        let mock = MockLlmClient::new();
        mock.push(Err(AutodocError::Llm("rate limited".to_string())));
        let err = mock.complete(CompletionRequest::new("s")).await.unwrap_err();
        assert_eq!(err.to_string(), "LLM error: rate limited");
    }

    #[tokio::test]
    async fn test_mock_captures_requests() {
        let mock = MockLlmClient::with_texts(["ok"]);
        let _ = mock
            .complete(CompletionRequest::new("system").with_user_message("hello"))
            .await;

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "system");
        assert_eq!(requests[0].messages[0].content, "hello");
    }

    #[test]
    fn test_mock_identity() {
        let mock = MockLlmClient::new();
        assert!(mock.is_ready());
        assert_eq!(mock.model(), "mock-model");
    }
}
