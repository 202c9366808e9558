// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent routing and dispatch for the Ekkle sales pipeline.
//!
//! Maps lead state to the SDR/BDR/Closer personas, classifies inbound
//! intent, assembles prompts, and decides status/temperature transitions.

pub mod dispatcher;
pub mod hours;
pub mod intent;
pub mod personas;
pub mod router;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use hours::BusinessHours;
pub use intent::classify_intent;
pub use personas::{PersonaVars, persona_prompt};
pub use router::{Transition, apply_transitions, route};
