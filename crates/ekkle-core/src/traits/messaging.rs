// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait for the external messaging delivery API.

use async_trait::async_trait;

use crate::error::EkkleError;
use crate::types::SendReceipt;

/// Adapter for outbound WhatsApp delivery.
///
/// Phone numbers are plain digit strings; the adapter applies any
/// provider-specific suffix formatting before transmission.
#[async_trait]
pub trait MessagingAdapter: Send + Sync {
    /// Sends a plain-text message. Delivery failures are reported in the
    /// receipt, not as errors.
    async fn send_text(&self, phone: &str, text: &str) -> Result<SendReceipt, EkkleError>;

    /// Shows the "composing" presence indicator. Best-effort.
    async fn send_typing(&self, phone: &str) -> Result<(), EkkleError>;

    /// Clears the presence indicator. Best-effort.
    async fn clear_typing(&self, phone: &str) -> Result<(), EkkleError>;
}
