// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Ekkle sales pipeline.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides via the `EKKLE_` prefix.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::EkkleConfig;

use ekkle_core::EkkleError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point used by the binary: Figment layering
/// followed by range validation, with all failures surfaced as one
/// `EkkleError::Config`.
pub fn load_and_validate() -> Result<EkkleConfig, EkkleError> {
    let config = loader::load_config().map_err(|e| EkkleError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<EkkleConfig, EkkleError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| EkkleError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
