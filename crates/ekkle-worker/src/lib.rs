// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue worker pool for the Ekkle sales pipeline.
//!
//! Dequeues inbound WhatsApp jobs with bounded concurrency, a global rate
//! cap, and strict per-lead ordering (phone-grouped queue partitions), and
//! drives the full per-message pipeline: store, context, agent dispatch,
//! delivery.

pub mod limiter;
pub mod pipeline;
pub mod pool;

pub use limiter::RateLimiter;
pub use pipeline::Pipeline;
pub use pool::WorkerPool;
