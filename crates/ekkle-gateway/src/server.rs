// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for webhook ingestion and
//! the operational health endpoints.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use ekkle_config::model::ServerConfig;
use ekkle_core::EkkleError;
use ekkle_storage::Database;
use tower_http::cors::CorsLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Storage handle, also the queue backing store.
    pub db: Arc<Database>,
    /// Shared secret required on webhook calls. `None` accepts all.
    pub webhook_secret: Option<String>,
    /// Max attempts stamped onto enqueued jobs.
    pub max_attempts: i32,
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/webhook/whatsapp",
            post(handlers::post_webhook).get(handlers::get_webhook),
        )
        .route("/health/live", get(handlers::get_live))
        .route("/health/ready", get(handlers::get_ready))
        .route("/health/queue", get(handlers::get_queue_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server and serve until the task is aborted.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), EkkleError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EkkleError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| EkkleError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekkle_test_utils::open_temp_db;

    #[tokio::test]
    async fn state_is_clone_and_redacts_secret() {
        let (db, _dir) = open_temp_db().await;
        let state = GatewayState {
            db,
            webhook_secret: Some("hunter2".to_string()),
            max_attempts: 3,
        };
        let cloned = state.clone();
        let debug = format!("{cloned:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }

    #[tokio::test]
    async fn router_builds() {
        let (db, _dir) = open_temp_db().await;
        let state = GatewayState {
            db,
            webhook_secret: None,
            max_attempts: 3,
        };
        let _app = router(state);
    }
}
