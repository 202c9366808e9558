// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Evolution API (WhatsApp delivery).
//!
//! Phone numbers are normalized to the provider's `@s.whatsapp.net` suffix
//! format before transmission. Presence (typing-indicator) failures are
//! swallowed; text delivery failures are reported in the receipt so the
//! caller decides whether they matter.

use std::time::Duration;

use async_trait::async_trait;
use ekkle_config::model::WhatsappConfig;
use ekkle_core::types::SendReceipt;
use ekkle_core::{EkkleError, MessagingAdapter};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, error, info, warn};

/// Evolution API client.
#[derive(Debug, Clone)]
pub struct EvolutionClient {
    client: reqwest::Client,
    base_url: String,
    instance: String,
}

/// Strip non-digits and append the provider suffix.
///
/// `55 (11) 99999-9999` -> `5511999999999@s.whatsapp.net`
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{digits}@s.whatsapp.net")
}

impl EvolutionClient {
    /// Creates a new Evolution API client from configuration.
    ///
    /// Requires `whatsapp.base_url` and `whatsapp.api_key`.
    pub fn new(config: &WhatsappConfig) -> Result<Self, EkkleError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            EkkleError::Config("whatsapp.base_url is required (set EKKLE_WHATSAPP_BASE_URL)".into())
        })?;
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            EkkleError::Config("whatsapp.api_key is required (set EKKLE_WHATSAPP_API_KEY)".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| EkkleError::Config(format!("invalid apikey header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EkkleError::Messaging {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            instance: config.instance.clone(),
        })
    }

    async fn set_presence(&self, phone: &str, presence: &str) -> Result<(), reqwest::Error> {
        let url = format!("{}/chat/presence/{}", self.base_url, self.instance);
        self.client
            .post(&url)
            .json(&serde_json::json!({
                "number": format_phone(phone),
                "presence": presence,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Check the connection state of the configured instance.
    pub async fn connection_state(&self) -> Result<bool, EkkleError> {
        let url = format!(
            "{}/instance/connectionState/{}",
            self.base_url, self.instance
        );
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| EkkleError::Messaging {
                    message: format!("connection state request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let body: serde_json::Value =
            response.json().await.map_err(|e| EkkleError::Messaging {
                message: format!("connection state parse failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(body.get("state").and_then(|s| s.as_str()) == Some("open"))
    }
}

#[async_trait]
impl MessagingAdapter for EvolutionClient {
    async fn send_text(&self, phone: &str, text: &str) -> Result<SendReceipt, EkkleError> {
        let started = std::time::Instant::now();
        let url = format!("{}/message/sendText/{}", self.base_url, self.instance);

        let response = match self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "number": format_phone(phone),
                "text": text,
                // Evolution-internal send delay, independent of our pacing.
                "delay": 500,
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(phone, error = %e, "sendText request failed");
                return Ok(SendReceipt::failed(e.to_string()));
            }
        };

        let status = response.status();
        let latency_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(phone, %status, body = %body, latency_ms, "Evolution API error");
            return Ok(SendReceipt::failed(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message_id = body
            .pointer("/key/id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        info!(phone, ?message_id, latency_ms, "WhatsApp text message sent");
        Ok(SendReceipt::ok(message_id))
    }

    async fn send_typing(&self, phone: &str) -> Result<(), EkkleError> {
        if let Err(e) = self.set_presence(phone, "composing").await {
            // Not critical if this fails.
            warn!(phone, error = %e, "failed to send typing indicator");
        } else {
            debug!(phone, "typing indicator sent");
        }
        Ok(())
    }

    async fn clear_typing(&self, phone: &str) -> Result<(), EkkleError> {
        let _ = self.set_presence(phone, "paused").await;
        Ok(())
    }
}
