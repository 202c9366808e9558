// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Figment catches type errors; this pass checks value ranges and
//! cross-field constraints that serde cannot express.

use ekkle_core::EkkleError;

use crate::model::EkkleConfig;

/// Validate a loaded configuration.
///
/// Collects every violation before returning so the operator sees the full
/// list in one run.
pub fn validate_config(config: &EkkleConfig) -> Result<(), EkkleError> {
    let mut errors: Vec<String> = Vec::new();

    if !(0.0..=2.0).contains(&config.agent.reply_temperature) {
        errors.push(format!(
            "agent.reply_temperature must be within 0.0..=2.0 (got {})",
            config.agent.reply_temperature
        ));
    }
    if config.agent.reply_max_tokens == 0 {
        errors.push("agent.reply_max_tokens must be at least 1".to_string());
    }
    if config.agent.off_hours_replies.is_empty() {
        errors.push("agent.off_hours_replies must contain at least one reply".to_string());
    }

    if config.queue.concurrency == 0 {
        errors.push("queue.concurrency must be at least 1".to_string());
    }
    if config.queue.rate_per_sec == 0 {
        errors.push("queue.rate_per_sec must be at least 1".to_string());
    }
    if config.queue.max_attempts < 1 {
        errors.push(format!(
            "queue.max_attempts must be at least 1 (got {})",
            config.queue.max_attempts
        ));
    }

    if config.hours.start_hour >= config.hours.end_hour {
        errors.push(format!(
            "hours.start_hour ({}) must be before hours.end_hour ({})",
            config.hours.start_hour, config.hours.end_hour
        ));
    }
    if config.hours.end_hour > 24 {
        errors.push(format!(
            "hours.end_hour must be within 0..=24 (got {})",
            config.hours.end_hour
        ));
    }
    if !(-12..=14).contains(&config.hours.utc_offset_hours) {
        errors.push(format!(
            "hours.utc_offset_hours must be within -12..=14 (got {})",
            config.hours.utc_offset_hours
        ));
    }

    if config.whatsapp.delay_min_ms > config.whatsapp.delay_max_ms {
        errors.push(format!(
            "whatsapp.delay_min_ms ({}) must not exceed whatsapp.delay_max_ms ({})",
            config.whatsapp.delay_min_ms, config.whatsapp.delay_max_ms
        ));
    }

    if config.memory.recent_limit < 1 {
        errors.push("memory.recent_limit must be at least 1".to_string());
    }
    if config.memory.summary_fetch_limit < config.memory.recent_limit {
        errors.push(format!(
            "memory.summary_fetch_limit ({}) must be at least memory.recent_limit ({})",
            config.memory.summary_fetch_limit, config.memory.recent_limit
        ));
    }

    if config.market.freshness_hours < 1 {
        errors.push("market.freshness_hours must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(EkkleError::Config(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EkkleConfig;

    #[test]
    fn default_config_is_valid() {
        validate_config(&EkkleConfig::default()).unwrap();
    }

    #[test]
    fn rejects_inverted_business_hours() {
        let mut config = EkkleConfig::default();
        config.hours.start_hour = 18;
        config.hours.end_hour = 8;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("start_hour"));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = EkkleConfig::default();
        config.queue.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_inverted_delay_window() {
        let mut config = EkkleConfig::default();
        config.whatsapp.delay_min_ms = 5000;
        config.whatsapp.delay_max_ms = 1000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn collects_multiple_violations() {
        let mut config = EkkleConfig::default();
        config.queue.concurrency = 0;
        config.queue.rate_per_sec = 0;
        let err = validate_config(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("concurrency"));
        assert!(msg.contains("rate_per_sec"));
    }

    #[test]
    fn rejects_empty_off_hours_replies() {
        let mut config = EkkleConfig::default();
        config.agent.off_hours_replies.clear();
        assert!(validate_config(&config).is_err());
    }
}
