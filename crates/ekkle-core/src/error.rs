// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ekkle sales pipeline.

use thiserror::Error;

/// The primary error type used across all Ekkle crates.
#[derive(Debug, Error)]
pub enum EkkleError {
    /// Configuration errors (invalid TOML, missing required fields, bad ranges).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion API errors (HTTP failure, malformed response, rate limiting).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Messaging delivery errors (Evolution API unreachable, bad payload).
    #[error("messaging error: {message}")]
    Messaging {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Job queue errors (malformed payload, lost entry).
    #[error("queue error: {0}")]
    Queue(String),

    /// Agent pipeline errors (classification, extraction, dispatch failure).
    #[error("pipeline error: {message}")]
    Pipeline {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EkkleError {
    /// Shorthand for a pipeline error without an underlying source.
    pub fn pipeline(message: impl Into<String>) -> Self {
        EkkleError::Pipeline {
            message: message.into(),
            source: None,
        }
    }
}
