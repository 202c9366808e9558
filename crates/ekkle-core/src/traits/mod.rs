// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the external-dependency seams.
//!
//! Every client that talks to the outside world (completion API, messaging
//! API, wall clock) is injected behind one of these traits so the pipeline
//! can be driven against fakes in tests.

pub mod clock;
pub mod completion;
pub mod messaging;

pub use clock::{Clock, SystemClock};
pub use completion::CompletionAdapter;
pub use messaging::MessagingAdapter;
