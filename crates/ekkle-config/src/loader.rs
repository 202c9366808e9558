// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ekkle.toml` > `~/.config/ekkle/ekkle.toml` >
//! `/etc/ekkle/ekkle.toml` with environment variable overrides via the
//! `EKKLE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EkkleConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ekkle/ekkle.toml` (system-wide)
/// 3. `~/.config/ekkle/ekkle.toml` (user XDG config)
/// 4. `./ekkle.toml` (local directory)
/// 5. `EKKLE_*` environment variables
pub fn load_config() -> Result<EkkleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EkkleConfig::default()))
        .merge(Toml::file("/etc/ekkle/ekkle.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("ekkle/ekkle.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("ekkle.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<EkkleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EkkleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EkkleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EkkleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// CRITICAL: uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. `EKKLE_WHATSAPP_API_KEY` must map to
/// `whatsapp.api_key`, not `whatsapp.api.key`.
fn env_provider() -> Env {
    Env::prefixed("EKKLE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: EKKLE_COMPLETION_API_KEY -> "completion_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("completion_", "completion.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("webhook_", "webhook.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("hours_", "hours.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("market_", "market.", 1);
        mapped.into()
    })
}
