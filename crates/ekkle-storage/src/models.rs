// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `ekkle-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use ekkle_core::types::{
    AgentExecution, Conversation, ConversationSummary, Lead, MarketAnalysisRecord, Metadata,
    QueueEntry, QueueStats,
};
