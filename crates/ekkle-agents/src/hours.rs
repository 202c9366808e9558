// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business-hours calendar.
//!
//! Live agent replies are generated Mon-Fri between the configured hours at
//! a fixed UTC offset. Time is read through the injected clock, never
//! directly, so tests can pin it.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use ekkle_config::model::HoursConfig;

/// Fixed weekly window during which live agent replies are generated.
#[derive(Debug, Clone)]
pub struct BusinessHours {
    config: HoursConfig,
}

impl BusinessHours {
    pub fn new(config: HoursConfig) -> Self {
        Self { config }
    }

    /// Whether `now` falls inside the business window.
    pub fn is_within(&self, now: DateTime<Utc>) -> bool {
        let local = now + Duration::hours(self.config.utc_offset_hours as i64);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let hour = local.hour();
        hour >= self.config.start_hour && hour < self.config.end_hour
    }
}
