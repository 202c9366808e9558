// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ekkle integration tests.
//!
//! Mock adapters behind the core traits, a pinnable clock, and database
//! fixtures. Used as a dev-dependency by the other workspace crates.

pub mod clock;
pub mod harness;
pub mod mock_completion;
pub mod mock_messaging;

pub use clock::FixedClock;
pub use harness::{open_temp_db, seed_lead, seed_messages};
pub use mock_completion::MockCompletion;
pub use mock_messaging::{MockMessaging, SentMessage};
