// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ekkle serve` command implementation.
//!
//! Constructs every client at the process root (no global singletons),
//! wires the dispatcher and pipeline, then runs the ingestion gateway and
//! the worker pool side by side until SIGINT. Shutdown is graceful: the
//! pool finishes in-flight jobs before the storage checkpoint.

use std::sync::Arc;

use ekkle_agents::Dispatcher;
use ekkle_completion::CompletionClient;
use ekkle_config::model::EkkleConfig;
use ekkle_core::{Clock, CompletionAdapter, EkkleError, MessagingAdapter, SystemClock};
use ekkle_gateway::GatewayState;
use ekkle_market::MarketAnalysisService;
use ekkle_memory::ContextBuilder;
use ekkle_storage::Database;
use ekkle_whatsapp::{EvolutionClient, HumanPacer};
use ekkle_worker::{Pipeline, WorkerPool};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the `ekkle serve` command.
pub async fn run_serve(config: EkkleConfig) -> Result<(), EkkleError> {
    init_tracing(&config.agent.log_level);
    info!("starting ekkle serve");

    // Storage (runs migrations on open).
    let db = Arc::new(Database::open(&config.storage.database_path).await?);

    // External clients, dependency-injected from here down.
    let completion: Arc<dyn CompletionAdapter> =
        Arc::new(CompletionClient::new(&config.completion)?);
    let evolution = Arc::new(EvolutionClient::new(&config.whatsapp)?);
    match evolution.connection_state().await {
        Ok(true) => info!("Evolution instance connected"),
        Ok(false) => warn!("Evolution instance not connected, sends will fail until it is"),
        Err(e) => warn!(error = %e, "could not verify Evolution connection state"),
    }
    let messaging: Arc<dyn MessagingAdapter> = evolution;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Services.
    let context = ContextBuilder::new(db.clone(), completion.clone(), config.memory.clone());
    let market = MarketAnalysisService::new(db.clone(), clock.clone(), config.market.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        completion,
        context,
        market,
        clock,
        config.hours.clone(),
        config.agent.clone(),
        config.memory.clone(),
    ));
    let pacer = Arc::new(HumanPacer::new(&config.whatsapp));
    let pipeline = Arc::new(Pipeline::new(db.clone(), dispatcher, messaging, pacer));
    let pool = WorkerPool::new(db.clone(), pipeline, config.queue.clone());

    // Gateway.
    let state = GatewayState {
        db: db.clone(),
        webhook_secret: config.webhook.secret.clone(),
        max_attempts: config.queue.max_attempts,
    };
    let server_config = config.server.clone();
    let gateway_handle = tokio::spawn(async move {
        if let Err(e) = ekkle_gateway::start_server(&server_config, state).await {
            error!(error = %e, "gateway server error");
        }
    });

    // Worker pool.
    let shutdown = CancellationToken::new();
    let pool_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { pool.run(shutdown).await })
    };

    // Wait for SIGINT, then drain.
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received, draining workers");

    shutdown.cancel();
    gateway_handle.abort();
    if let Err(e) = pool_handle.await {
        error!(error = %e, "worker pool join error");
    }
    db.close().await?;

    info!("ekkle stopped");
    Ok(())
}
