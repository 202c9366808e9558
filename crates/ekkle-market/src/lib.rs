// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Market analysis for the Ekkle sales pipeline.
//!
//! Scores a lead's region (competitor density, digital presence) with a
//! replaceable heuristic, caches results per lead, and degrades to a
//! neutral default on failure.

pub mod scoring;
pub mod service;

pub use scoring::{AnalysisResult, neutral_fallback, score_region};
pub use service::{ANALYSIS_TYPE, MarketAnalysisService, format_for_prompt};
