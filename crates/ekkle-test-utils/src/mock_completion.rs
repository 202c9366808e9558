// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion adapter for deterministic testing.
//!
//! `MockCompletion` implements `CompletionAdapter` with pre-configured
//! responses, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ekkle_core::types::{CompletionRequest, CompletionResult};
use ekkle_core::{CompletionAdapter, EkkleError};

enum Scripted {
    Reply(String),
    Error(String),
}

/// A mock completion client that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty, a
/// default "mock response" text is returned. Every request is recorded for
/// prompt inspection.
pub struct MockCompletion {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletion {
    /// Create a new mock with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<&str>) -> Self {
        let mock = Self::new();
        {
            let mut queue = mock.responses.try_lock().expect("fresh mock");
            for response in responses {
                queue.push_back(Scripted::Reply(response.to_string()));
            }
        }
        mock
    }

    /// Queue a successful response.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Scripted::Reply(text.into()));
    }

    /// Queue a failure; the corresponding `complete` call returns an error.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Scripted::Error(message.into()));
    }

    /// All requests seen so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of `complete` calls made.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionAdapter for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, EkkleError> {
        self.requests.lock().await.push(request);
        match self.responses.lock().await.pop_front() {
            Some(Scripted::Reply(content)) => Ok(CompletionResult {
                content,
                tokens_used: 30,
                finish_reason: Some("stop".to_string()),
            }),
            Some(Scripted::Error(message)) => Err(EkkleError::Completion {
                message,
                source: None,
            }),
            None => Ok(CompletionResult {
                content: "mock response".to_string(),
                tokens_used: 30,
                finish_reason: Some("stop".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekkle_core::types::ChatMessage;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user(text)],
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn responses_returned_in_order_then_default() {
        let mock = MockCompletion::with_responses(vec!["first", "second"]);
        assert_eq!(mock.complete(request("a")).await.unwrap().content, "first");
        assert_eq!(mock.complete(request("b")).await.unwrap().content, "second");
        assert_eq!(
            mock.complete(request("c")).await.unwrap().content,
            "mock response"
        );
        assert_eq!(mock.call_count().await, 3);
    }

    #[tokio::test]
    async fn scripted_error_surfaces() {
        let mock = MockCompletion::new();
        mock.push_error("simulated outage").await;
        let err = mock.complete(request("a")).await.unwrap_err();
        assert!(err.to_string().contains("simulated outage"));
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let mock = MockCompletion::new();
        let _ = mock.complete(request("inspect me")).await;
        let requests = mock.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "inspect me");
    }
}
