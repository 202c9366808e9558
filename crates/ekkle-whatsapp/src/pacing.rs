// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Humanized delivery pacing.
//!
//! Before a reply goes out, the pipeline shows a typing indicator for a
//! duration scaled to message length (capped), then waits a randomized
//! delay. These sleeps are deliberate and non-cancelable on the sending
//! path.

use std::time::Duration;

use ekkle_config::model::WhatsappConfig;
use ekkle_core::types::SendReceipt;
use ekkle_core::{EkkleError, MessagingAdapter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::debug;

/// Computes typing and delay durations for humanized delivery.
///
/// The RNG is seedable so tests get deterministic delays.
pub struct HumanPacer {
    typing_ms_per_char: u64,
    typing_cap_ms: u64,
    delay_min_ms: u64,
    delay_max_ms: u64,
    rng: Mutex<StdRng>,
}

impl HumanPacer {
    /// Create a pacer with an entropy-seeded RNG.
    pub fn new(config: &WhatsappConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a pacer with a fixed seed (deterministic delays for tests).
    pub fn seeded(config: &WhatsappConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &WhatsappConfig, rng: StdRng) -> Self {
        Self {
            typing_ms_per_char: config.typing_ms_per_char,
            typing_cap_ms: config.typing_cap_ms,
            delay_min_ms: config.delay_min_ms,
            delay_max_ms: config.delay_max_ms,
            rng: Mutex::new(rng),
        }
    }

    /// Typing-indicator duration scaled to message length, capped.
    pub fn typing_duration(&self, message_len: usize) -> Duration {
        let ms = (message_len as u64)
            .saturating_mul(self.typing_ms_per_char)
            .min(self.typing_cap_ms);
        Duration::from_millis(ms)
    }

    /// Uniformly sampled humanized delay within the configured window.
    pub async fn humanized_delay(&self) -> Duration {
        let mut rng = self.rng.lock().await;
        if self.delay_max_ms <= self.delay_min_ms {
            return Duration::from_millis(self.delay_min_ms);
        }
        Duration::from_millis(rng.gen_range(self.delay_min_ms..=self.delay_max_ms))
    }
}

/// Deliver a text with humanized pacing: typing indicator, length-scaled
/// pause, randomized delay, send, presence clear.
///
/// Indicator failures never affect the send.
pub async fn deliver_with_pacing(
    messaging: &dyn MessagingAdapter,
    pacer: &HumanPacer,
    phone: &str,
    text: &str,
) -> Result<SendReceipt, EkkleError> {
    messaging.send_typing(phone).await?;
    let typing = pacer.typing_duration(text.chars().count());
    tokio::time::sleep(typing).await;

    let delay = pacer.humanized_delay().await;
    debug!(
        phone,
        typing_ms = typing.as_millis() as u64,
        delay_ms = delay.as_millis() as u64,
        "applying humanized pacing"
    );
    tokio::time::sleep(delay).await;

    let receipt = messaging.send_text(phone, text).await?;
    messaging.clear_typing(phone).await?;
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_config() -> WhatsappConfig {
        WhatsappConfig {
            typing_ms_per_char: 30,
            typing_cap_ms: 3000,
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn typing_duration_scales_with_length() {
        let pacer = HumanPacer::seeded(&instant_config(), 7);
        assert_eq!(pacer.typing_duration(10), Duration::from_millis(300));
        assert_eq!(pacer.typing_duration(0), Duration::ZERO);
    }

    #[test]
    fn typing_duration_is_capped() {
        let pacer = HumanPacer::seeded(&instant_config(), 7);
        // 1000 chars * 30ms = 30s, capped at 3s.
        assert_eq!(pacer.typing_duration(1000), Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn humanized_delay_stays_in_window() {
        let config = WhatsappConfig {
            delay_min_ms: 1000,
            delay_max_ms: 3000,
            ..Default::default()
        };
        let pacer = HumanPacer::seeded(&config, 42);
        for _ in 0..32 {
            let delay = pacer.humanized_delay().await;
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[tokio::test]
    async fn same_seed_gives_same_delays() {
        let config = WhatsappConfig {
            delay_min_ms: 1000,
            delay_max_ms: 3000,
            ..Default::default()
        };
        let a = HumanPacer::seeded(&config, 9);
        let b = HumanPacer::seeded(&config, 9);
        for _ in 0..8 {
            assert_eq!(a.humanized_delay().await, b.humanized_delay().await);
        }
    }
}
