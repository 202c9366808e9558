// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait for the external chat-completion API.

use async_trait::async_trait;

use crate::error::EkkleError;
use crate::types::{CompletionRequest, CompletionResult};

/// Adapter for chat-completion providers.
///
/// Takes an ordered list of role-tagged messages plus sampling parameters
/// and returns generated text with token accounting.
#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, EkkleError>;
}
