// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool consuming the inbound queue.
//!
//! N consumer tasks pull jobs concurrently under a shared global rate cap.
//! Per-lead ordering is enforced by the queue itself: entries are grouped
//! by phone and dequeue hands out at most one entry per group, lowest id
//! first. A reaper task requeues stalled jobs and purges retention windows.
//! Shutdown is graceful: in-flight jobs finish, queued jobs wait for the
//! next start.

use std::sync::Arc;
use std::time::Duration;

use ekkle_config::model::QueueConfig;
use ekkle_core::types::InboundJob;
use ekkle_storage::Database;
use ekkle_storage::queries::queue::{self, WHATSAPP_INCOMING};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::limiter::RateLimiter;
use crate::pipeline::Pipeline;

/// Concurrent consumer pool over the durable queue.
pub struct WorkerPool {
    db: Arc<Database>,
    pipeline: Arc<Pipeline>,
    config: QueueConfig,
}

impl WorkerPool {
    pub fn new(db: Arc<Database>, pipeline: Arc<Pipeline>, config: QueueConfig) -> Self {
        Self {
            db,
            pipeline,
            config,
        }
    }

    /// Run the pool until `shutdown` fires, then drain in-flight jobs.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            concurrency = self.config.concurrency,
            rate_per_sec = self.config.rate_per_sec,
            "starting worker pool"
        );

        let limiter = RateLimiter::new(self.config.rate_per_sec);

        let refill = limiter.run_refill(shutdown.clone());
        let reaper = tokio::spawn(reaper_loop(
            Arc::clone(&self.db),
            self.config.clone(),
            shutdown.clone(),
        ));

        let mut consumers = Vec::with_capacity(self.config.concurrency);
        for worker_id in 0..self.config.concurrency {
            consumers.push(tokio::spawn(consumer_loop(
                worker_id,
                Arc::clone(&self.db),
                Arc::clone(&self.pipeline),
                Arc::clone(&limiter),
                self.config.clone(),
                shutdown.clone(),
            )));
        }

        for consumer in consumers {
            if let Err(e) = consumer.await {
                error!(error = %e, "worker task panicked");
            }
        }
        let _ = refill.await;
        let _ = reaper.await;
        info!("worker pool stopped");
    }
}

async fn consumer_loop(
    worker_id: usize,
    db: Arc<Database>,
    pipeline: Arc<Pipeline>,
    limiter: Arc<RateLimiter>,
    config: QueueConfig,
    shutdown: CancellationToken,
) {
    debug!(worker_id, "worker started");
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = limiter.acquire() => {}
        }

        let entry = match queue::dequeue(&db, WHATSAPP_INCOMING, config.lock_secs).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(worker_id, error = %e, "dequeue failed");
                idle(&shutdown, poll_interval).await;
                continue;
            }
        };

        let Some(entry) = entry else {
            idle(&shutdown, poll_interval).await;
            continue;
        };

        let job: InboundJob = match serde_json::from_str(&entry.payload) {
            Ok(job) => job,
            Err(e) => {
                error!(worker_id, entry_id = entry.id, error = %e, "malformed job payload");
                if let Err(fail_err) = queue::fail(&db, entry.id, config.backoff_base_ms).await {
                    warn!(error = %fail_err, "failed to mark malformed job");
                }
                continue;
            }
        };

        debug!(worker_id, entry_id = entry.id, phone = %job.phone, "processing job");

        match pipeline.process(&job).await {
            Ok(()) => {
                if let Err(e) = queue::ack(&db, entry.id).await {
                    warn!(entry_id = entry.id, error = %e, "failed to ack job");
                }
            }
            Err(e) => {
                error!(
                    worker_id,
                    entry_id = entry.id,
                    attempts = entry.attempts + 1,
                    error = %e,
                    "job failed"
                );
                if let Err(fail_err) = queue::fail(&db, entry.id, config.backoff_base_ms).await {
                    warn!(entry_id = entry.id, error = %fail_err, "failed to mark job failure");
                }
            }
        }
    }
    debug!(worker_id, "worker stopped");
}

async fn idle(shutdown: &CancellationToken, poll_interval: Duration) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(poll_interval) => {}
    }
}

/// Periodically requeue stalled jobs and purge retention windows.
async fn reaper_loop(db: Arc<Database>, config: QueueConfig, shutdown: CancellationToken) {
    let mut tick = tokio::time::interval(Duration::from_secs(config.reaper_interval_secs));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tick.tick() => {}
        }

        match queue::requeue_stalled(&db, WHATSAPP_INCOMING).await {
            Ok(0) => {}
            Ok(requeued) => warn!(requeued, "requeued stalled jobs"),
            Err(e) => warn!(error = %e, "stalled-job sweep failed"),
        }
        if let Err(e) = queue::purge_completed(
            &db,
            WHATSAPP_INCOMING,
            config.completed_retention_hours,
            config.completed_retention_count,
        )
        .await
        {
            warn!(error = %e, "completed purge failed");
        }
        if let Err(e) =
            queue::purge_failed(&db, WHATSAPP_INCOMING, config.failed_retention_hours).await
        {
            warn!(error = %e, "failed purge failed");
        }
    }
}
