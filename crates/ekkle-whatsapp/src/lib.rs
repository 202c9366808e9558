// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evolution API (WhatsApp) delivery client for the Ekkle sales pipeline.
//!
//! Implements the `MessagingAdapter` trait from `ekkle-core`, plus the
//! humanized pacing applied on the sending path.

pub mod client;
pub mod pacing;

pub use client::{EvolutionClient, format_phone};
pub use pacing::{HumanPacer, deliver_with_pacing};
