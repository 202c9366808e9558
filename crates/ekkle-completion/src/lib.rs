// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completion API client for the Ekkle sales pipeline.
//!
//! Thin adapter over an OpenAI-compatible endpoint: prompt in, generated
//! text plus token accounting out. Implements the `CompletionAdapter` trait
//! from `ekkle-core`.

pub mod client;
pub mod types;

pub use client::CompletionClient;
