// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP ingestion gateway for the Ekkle sales pipeline.
//!
//! Receives provider-shaped WhatsApp webhooks, normalizes and deduplicates
//! them into queue jobs, and exposes liveness/readiness/queue-statistics
//! endpoints. Always acknowledges application-level problems with 200 so
//! the provider only retries on transport failures.

pub mod handlers;
pub mod payload;
pub mod server;

pub use payload::{WebhookEvent, decode_webhook, extract_phone};
pub use server::{GatewayState, router, start_server};
