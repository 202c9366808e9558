// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging adapter that records deliveries instead of sending them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ekkle_core::types::SendReceipt;
use ekkle_core::{EkkleError, MessagingAdapter};

/// A recorded outbound delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub phone: String,
    pub text: String,
}

/// Mock WhatsApp client: records sends, optionally simulates failures.
pub struct MockMessaging {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    typing_calls: AtomicUsize,
    fail_sends: AtomicBool,
}

impl MockMessaging {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            typing_calls: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// All recorded deliveries, in send order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Number of typing-indicator calls.
    pub fn typing_calls(&self) -> usize {
        self.typing_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent sends report failure in the receipt.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockMessaging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingAdapter for MockMessaging {
    async fn send_text(&self, phone: &str, text: &str) -> Result<SendReceipt, EkkleError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Ok(SendReceipt::failed("simulated delivery failure"));
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentMessage {
            phone: phone.to_string(),
            text: text.to_string(),
        });
        Ok(SendReceipt::ok(Some(format!("mock-{}", sent.len()))))
    }

    async fn send_typing(&self, _phone: &str) -> Result<(), EkkleError> {
        self.typing_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_typing(&self, _phone: &str) -> Result<(), EkkleError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sends_in_order() {
        let mock = MockMessaging::new();
        mock.send_text("5511", "one").await.unwrap();
        mock.send_text("5511", "two").await.unwrap();
        let sent = mock.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "one");
        assert_eq!(sent[1].text, "two");
    }

    #[tokio::test]
    async fn simulated_failure_reports_in_receipt() {
        let mock = MockMessaging::new();
        mock.fail_sends(true);
        let receipt = mock.send_text("5511", "lost").await.unwrap();
        assert!(!receipt.success);
        assert!(mock.sent().await.is_empty());
    }
}
