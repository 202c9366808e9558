// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global job rate cap shared across the worker pool.
//!
//! A semaphore refilled once per second to the configured rate. Consumers
//! forget the permit they take, so at most `rate_per_sec` jobs start per
//! refill window regardless of worker count.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Token-bucket style limiter: `rate_per_sec` job starts per second.
pub struct RateLimiter {
    permits: Semaphore,
    rate_per_sec: usize,
}

impl RateLimiter {
    pub fn new(rate_per_sec: usize) -> Arc<Self> {
        Arc::new(Self {
            permits: Semaphore::new(rate_per_sec),
            rate_per_sec,
        })
    }

    /// Wait for a job slot in the current window.
    pub async fn acquire(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    /// Spawn the once-per-second refill task.
    pub fn run_refill(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tick.tick() => {
                        let missing = limiter
                            .rate_per_sec
                            .saturating_sub(limiter.permits.available_permits());
                        if missing > 0 {
                            limiter.permits.add_permits(missing);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_is_capped_at_rate() {
        let limiter = RateLimiter::new(3);
        // Three immediate acquisitions succeed...
        for _ in 0..3 {
            limiter.acquire().await;
        }
        // ...the fourth would block until a refill.
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            limiter.acquire(),
        )
        .await;
        assert!(blocked.is_err(), "fourth acquire should block without refill");
    }

    #[tokio::test]
    async fn refill_replenishes_permits() {
        tokio::time::pause();
        let limiter = RateLimiter::new(2);
        let shutdown = CancellationToken::new();
        let refill = limiter.run_refill(shutdown.clone());

        limiter.acquire().await;
        limiter.acquire().await;

        // Advance past a refill tick; the next acquire completes.
        tokio::time::advance(std::time::Duration::from_millis(1100)).await;
        tokio::time::timeout(std::time::Duration::from_millis(100), limiter.acquire())
            .await
            .expect("acquire after refill");

        shutdown.cancel();
        let _ = refill.await;
    }
}
