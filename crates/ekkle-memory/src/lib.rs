// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory for the Ekkle sales pipeline.
//!
//! Assembles bounded context (recent history + rolling summary) for agent
//! prompts and extracts structured facts from inbound messages.

pub mod context;
pub mod extractor;

pub use context::{AgentContext, ContextBuilder};
pub use extractor::{extract_lead_facts, merge_metadata};
