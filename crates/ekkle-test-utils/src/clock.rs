// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed clock for pinning business-hours and freshness checks in tests.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use ekkle_core::Clock;

/// A clock that returns a pinned instant until told otherwise.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Pin the clock to the given instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Pin the clock to a UTC date and time.
    pub fn at_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let now = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("valid test timestamp");
        Self::at(now)
    }

    /// Move the pinned instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = now;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_time_is_stable() {
        let clock = FixedClock::at_utc(2026, 8, 4, 12, 0);
        assert_eq!(clock.now_utc(), clock.now_utc());
    }

    #[test]
    fn set_moves_the_clock() {
        let clock = FixedClock::at_utc(2026, 8, 4, 12, 0);
        let later = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now_utc(), later);
    }
}
