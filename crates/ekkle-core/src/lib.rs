// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ekkle WhatsApp sales pipeline.
//!
//! This crate provides the foundational error type, domain model types, and
//! the adapter traits implemented by the concrete completion and messaging
//! clients. All other workspace crates depend on it.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EkkleError;
pub use traits::{Clock, CompletionAdapter, MessagingAdapter, SystemClock};
pub use types::{
    AgentStage, Direction, ExecutionStatus, Intent, LeadStatus, Opportunity, Temperature,
};
