// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the chat-completion API.
//!
//! Provides [`CompletionClient`] which handles request construction, bearer
//! authentication, and transient error retry against any OpenAI-compatible
//! endpoint (Kimi in production).

use std::time::Duration;

use async_trait::async_trait;
use ekkle_config::model::CompletionConfig;
use ekkle_core::types::{CompletionRequest, CompletionResult};
use ekkle_core::{CompletionAdapter, EkkleError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ApiMessage, ChatCompletionRequest, ChatCompletionResponse};

/// HTTP client for chat-completion API communication.
///
/// Manages authentication headers, connection pooling, and retry logic for
/// transient errors (429, 500, 503, 529).
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    endpoint: String,
}

impl CompletionClient {
    /// Creates a new completion client from configuration.
    ///
    /// Requires `completion.api_key` to be set (config file or
    /// `EKKLE_COMPLETION_API_KEY`).
    pub fn new(config: &CompletionConfig) -> Result<Self, EkkleError> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            EkkleError::Config(
                "completion.api_key is required (set EKKLE_COMPLETION_API_KEY)".to_string(),
            )
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                EkkleError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EkkleError::Completion {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            model: config.model.clone(),
            max_retries: 1,
            endpoint,
        })
    }

    /// Returns the configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<reqwest::Response, EkkleError> {
        self.client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| EkkleError::Completion {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl CompletionAdapter for CompletionClient {
    /// Sends a completion request and returns the full response.
    ///
    /// On transient errors (429, 500, 503, 529), retries once after a
    /// 1-second delay.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, EkkleError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let started = std::time::Instant::now();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self.send_once(&body).await?;
            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let text = response.text().await.map_err(|e| EkkleError::Completion {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed: ChatCompletionResponse =
                    serde_json::from_str(&text).map_err(|e| EkkleError::Completion {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;

                let choice = parsed.choices.into_iter().next();
                let content = choice
                    .as_ref()
                    .and_then(|c| c.message.content.clone())
                    .unwrap_or_default();
                let finish_reason = choice.and_then(|c| c.finish_reason);
                let tokens_used = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

                debug!(
                    tokens_used,
                    latency_ms = started.elapsed().as_millis() as u64,
                    response_len = content.len(),
                    "completion succeeded"
                );

                return Ok(CompletionResult {
                    content,
                    tokens_used,
                    finish_reason,
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body_text = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body_text, "transient error, will retry");
                last_error = Some(EkkleError::Completion {
                    message: format!("API returned {status}: {body_text}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body_text = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body_text)
            {
                format!(
                    "completion API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                )
            } else {
                format!("API returned {status}: {body_text}")
            };
            return Err(EkkleError::Completion {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| EkkleError::Completion {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
