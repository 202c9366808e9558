// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the ingestion gateway.
//!
//! The webhook always acknowledges with 200 so the provider never retries
//! on application-level problems; the only non-200 is 401 on a shared
//! secret mismatch. Validation failures are logged and acknowledged as
//! unprocessed.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use ekkle_core::types::InboundJob;
use serde::Serialize;
use tracing::{debug, info, warn};

use ekkle_storage::queries::queue::{self, WHATSAPP_INCOMING};

use crate::payload::{WebhookEvent, decode_webhook, extract_phone};
use crate::server::GatewayState;

/// Acknowledgment body returned for every accepted webhook call.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
}

impl WebhookResponse {
    fn ignored(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            processed: false,
            job_id: None,
        }
    }
}

/// Error body for the 401 path.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn secret_matches(headers: &HeaderMap, expected: &str) -> bool {
    let provided = headers
        .get("x-webhook-secret")
        .or_else(|| headers.get("authorization"))
        .and_then(|v| v.to_str().ok());
    match provided {
        Some(value) => value == expected || value == format!("Bearer {expected}"),
        None => false,
    }
}

/// POST /webhook/whatsapp
///
/// Validates and normalizes the provider payload and enqueues a job keyed
/// by the provider message id. Queue insertion is the only side effect.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Some(secret) = &state.webhook_secret {
        if !secret_matches(&headers, secret) {
            warn!("webhook rejected: invalid shared secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    error: "Unauthorized".to_string(),
                }),
            )
                .into_response();
        }
    }

    let envelope = match decode_webhook(&body) {
        WebhookEvent::Message(envelope) => envelope,
        WebhookEvent::Unrecognized => {
            // Acknowledge anyway so the provider does not retry.
            warn!("webhook payload not recognized");
            return (
                StatusCode::OK,
                Json(WebhookResponse::ignored("Payload ignored (invalid format)")),
            )
                .into_response();
        }
    };

    info!(
        event = %envelope.event,
        instance = %envelope.instance,
        "WhatsApp webhook received"
    );

    // Discard self-originated messages.
    if envelope.data.key.from_me {
        debug!("ignoring outbound message");
        return (
            StatusCode::OK,
            Json(WebhookResponse::ignored("Outbound message ignored")),
        )
            .into_response();
    }

    let Some(text) = envelope.data.message.text() else {
        debug!("ignoring non-text message");
        return (
            StatusCode::OK,
            Json(WebhookResponse::ignored("Non-text message ignored")),
        )
            .into_response();
    };

    let job = InboundJob {
        phone: extract_phone(&envelope.data.key.remote_jid),
        message: text.to_string(),
        push_name: envelope.data.push_name.clone(),
        message_id: envelope.data.key.id.clone(),
        timestamp: envelope.data.message_timestamp,
    };

    let payload = match serde_json::to_string(&job) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "failed to serialize job payload");
            return (
                StatusCode::OK,
                Json(WebhookResponse::ignored("Error logged, not processed")),
            )
                .into_response();
        }
    };

    match queue::enqueue(
        &state.db,
        WHATSAPP_INCOMING,
        &job.message_id,
        Some(&job.phone),
        &payload,
        state.max_attempts,
    )
    .await
    {
        Ok((job_id, created)) => {
            info!(
                phone = %job.phone,
                message_id = %job.message_id,
                job_id,
                deduplicated = !created,
                "message enqueued for processing"
            );
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    success: true,
                    message: "Message queued for processing".to_string(),
                    processed: true,
                    job_id: Some(job_id),
                }),
            )
                .into_response()
        }
        Err(e) => {
            // Internal failure still acknowledges; the provider must not
            // retry on application-level errors.
            warn!(error = %e, "failed to enqueue webhook message");
            (
                StatusCode::OK,
                Json(WebhookResponse::ignored("Error logged, will retry internally")),
            )
                .into_response()
        }
    }
}

/// GET /webhook/whatsapp -- endpoint liveness confirmation.
pub async fn get_webhook() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "WhatsApp webhook endpoint active",
        "service": "ekkle",
    }))
}

/// GET /health/live -- process liveness.
pub async fn get_live() -> Json<serde_json::Value> {
    Json(serde_json::json!({"success": true, "status": "alive"}))
}

/// GET /health/ready -- dependency-checked readiness (storage doubles as
/// the queue backing store).
pub async fn get_ready(State(state): State<GatewayState>) -> Response {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "status": "ready"})),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "success": false,
                    "status": "not ready",
                    "message": "Dependencies not available",
                })),
            )
                .into_response()
        }
    }
}

/// GET /health/queue -- queue depth counters.
pub async fn get_queue_stats(State(state): State<GatewayState>) -> Response {
    match queue::stats(&state.db, WHATSAPP_INCOMING).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "queue": WHATSAPP_INCOMING,
                "waiting": stats.waiting,
                "active": stats.active,
                "completed": stats.completed,
                "failed": stats.failed,
                "delayed": stats.delayed,
                "total": stats.waiting + stats.active + stats.delayed,
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "queue stats failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"success": false, "error": "queue unavailable"})),
            )
                .into_response()
        }
    }
}
