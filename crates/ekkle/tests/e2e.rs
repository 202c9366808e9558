// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline tests: webhook ingestion through the queue, worker
//! pool, agent dispatch, and delivery -- with all external APIs mocked.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use ekkle_agents::Dispatcher;
use ekkle_config::model::{
    AgentConfig, HoursConfig, MarketConfig, MemoryConfig, QueueConfig, WhatsappConfig,
};
use ekkle_core::types::InboundJob;
use ekkle_core::{AgentStage, Direction, ExecutionStatus, Intent, LeadStatus, Temperature};
use ekkle_gateway::GatewayState;
use ekkle_gateway::handlers::post_webhook;
use ekkle_market::MarketAnalysisService;
use ekkle_memory::ContextBuilder;
use ekkle_storage::Database;
use ekkle_storage::queries::queue::{self, WHATSAPP_INCOMING};
use ekkle_storage::queries::{conversations, executions, leads};
use ekkle_test_utils::{FixedClock, MockCompletion, MockMessaging, open_temp_db};
use ekkle_whatsapp::HumanPacer;
use ekkle_worker::{Pipeline, WorkerPool};
use tokio_util::sync::CancellationToken;

struct Harness {
    db: Arc<Database>,
    completion: Arc<MockCompletion>,
    messaging: Arc<MockMessaging>,
    pipeline: Arc<Pipeline>,
    state: GatewayState,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let (db, dir) = open_temp_db().await;
    let completion = Arc::new(MockCompletion::new());
    let messaging = Arc::new(MockMessaging::new());
    // Tuesday 2026-08-04 09:00 local (UTC-3) = 12:00 UTC: business hours.
    let clock = Arc::new(FixedClock::at_utc(2026, 8, 4, 12, 0));

    let context = ContextBuilder::new(db.clone(), completion.clone(), MemoryConfig::default());
    let market = MarketAnalysisService::seeded(db.clone(), clock.clone(), MarketConfig::default(), 7);
    let dispatcher = Arc::new(Dispatcher::seeded(
        completion.clone(),
        context,
        market,
        clock,
        HoursConfig::default(),
        AgentConfig::default(),
        MemoryConfig::default(),
        42,
    ));
    let pacer = Arc::new(HumanPacer::seeded(
        &WhatsappConfig {
            typing_ms_per_char: 0,
            typing_cap_ms: 0,
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..Default::default()
        },
        1,
    ));
    let pipeline = Arc::new(Pipeline::new(
        db.clone(),
        dispatcher,
        messaging.clone(),
        pacer,
    ));
    let state = GatewayState {
        db: db.clone(),
        webhook_secret: None,
        max_attempts: 3,
    };

    Harness {
        db,
        completion,
        messaging,
        pipeline,
        state,
        _dir: dir,
    }
}

fn webhook_body(message_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "event": "messages.upsert",
        "instance": "ekkle-sales",
        "data": {
            "key": {
                "remoteJid": "5511999990001@s.whatsapp.net",
                "fromMe": false,
                "id": message_id
            },
            "message": {"conversation": text},
            "messageTimestamp": 1700000000,
            "pushName": "Pr. João"
        }
    })
}

fn test_queue_config() -> QueueConfig {
    QueueConfig {
        concurrency: 2,
        rate_per_sec: 50,
        poll_interval_ms: 10,
        reaper_interval_secs: 1,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pricing_message_flows_webhook_to_delivery() {
    let h = harness().await;
    h.completion.push_response("pricing").await;
    h.completion.push_response("{}").await;
    h.completion
        .push_response("Our plans start at R$ 33 per month, pastor.")
        .await;

    // 1. Webhook ingestion enqueues exactly one job.
    let response = post_webhook(
        State(h.state.clone()),
        HeaderMap::new(),
        Json(webhook_body("abc-1", "Quero saber o preço")),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let stats = queue::stats(&h.db, WHATSAPP_INCOMING).await.unwrap();
    assert_eq!(stats.waiting, 1);

    // 2. The worker pool drains the queue.
    let pool = WorkerPool::new(h.db.clone(), h.pipeline.clone(), test_queue_config());
    let shutdown = CancellationToken::new();
    let pool_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { pool.run(shutdown).await })
    };
    for _ in 0..200 {
        let stats = queue::stats(&h.db, WHATSAPP_INCOMING).await.unwrap();
        if stats.completed == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    shutdown.cancel();
    pool_handle.await.unwrap();

    // 3. Lead created and advanced: new -> qualified/warm, agent sdr.
    let lead = leads::get_by_phone(&h.db, "5511999990001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.status, LeadStatus::Qualified);
    assert_eq!(lead.temperature, Temperature::Warm);
    assert_eq!(lead.assigned_agent, AgentStage::Sdr);
    assert_eq!(lead.name.as_deref(), Some("Pr. João"));

    // 4. One inbound + one outbound conversation row.
    let messages = conversations::recent(&h.db, &lead.id, 10).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].direction, Direction::Inbound);
    assert_eq!(messages[0].provider_message_id.as_deref(), Some("abc-1"));
    assert_eq!(messages[1].direction, Direction::Outbound);
    assert_eq!(messages[1].intent_detected, Intent::Pricing);

    // 5. Execution logged as completed.
    let execution_list = executions::for_lead(&h.db, &lead.id, 10).await.unwrap();
    assert_eq!(execution_list.len(), 1);
    assert_eq!(execution_list[0].status, ExecutionStatus::Completed);

    // 6. Delivered via the messaging client exactly once.
    let sent = h.messaging.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone, "5511999990001");
    assert_eq!(sent[0].text, "Our plans start at R$ 33 per month, pastor.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn redelivered_webhook_processes_once() {
    let h = harness().await;
    h.completion.push_response("greeting").await;
    h.completion.push_response("{}").await;
    h.completion.push_response("Welcome, pastor!").await;

    // Provider delivers the same payload three times.
    for _ in 0..3 {
        let response = post_webhook(
            State(h.state.clone()),
            HeaderMap::new(),
            Json(webhook_body("dup-1", "olá")),
        )
        .await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
    let stats = queue::stats(&h.db, WHATSAPP_INCOMING).await.unwrap();
    assert_eq!(stats.waiting, 1, "idempotent enqueue");

    let pool = WorkerPool::new(h.db.clone(), h.pipeline.clone(), test_queue_config());
    let shutdown = CancellationToken::new();
    let pool_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { pool.run(shutdown).await })
    };
    for _ in 0..200 {
        let stats = queue::stats(&h.db, WHATSAPP_INCOMING).await.unwrap();
        if stats.completed == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    shutdown.cancel();
    pool_handle.await.unwrap();

    let lead = leads::get_by_phone(&h.db, "5511999990001")
        .await
        .unwrap()
        .unwrap();
    let messages = conversations::recent(&h.db, &lead.id, 10).await.unwrap();
    assert_eq!(messages.len(), 2, "exactly one inbound + one outbound");
    assert_eq!(h.messaging.sent().await.len(), 1);

    // A later redelivery of the processed id is also a no-op end to end.
    h.pipeline
        .process(&InboundJob {
            phone: "5511999990001".to_string(),
            message: "olá".to_string(),
            push_name: None,
            message_id: "dup-1".to_string(),
            timestamp: 1_700_000_000,
        })
        .await
        .unwrap();
    let messages = conversations::recent(&h.db, &lead.id, 10).await.unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_funnel_progression_over_three_messages() {
    let h = harness().await;
    // Turn 1 (sdr): greeting with address -> contacted, analysis stored.
    h.completion.push_response("greeting").await;
    h.completion
        .push_response(r#"{"address": "Av. Paulista 1000, São Paulo", "instagram": "@igrejaviva"}"#)
        .await;
    h.completion.push_response("Thank you, pastor!").await;
    // Turn 2 (sdr, contacted): pricing -> qualified.
    h.completion.push_response("pricing").await;
    h.completion.push_response("{}").await;
    h.completion.push_response("Let me show you the region first.").await;
    // Turn 3 (bdr): closing -> negotiating/hot.
    h.completion.push_response("closing").await;
    h.completion.push_response("{}").await;
    h.completion.push_response("Wonderful! Here is the plan.").await;

    for (i, text) in [
        "Graça e paz! Av. Paulista 1000, São Paulo, insta @igrejaviva",
        "Quanto custa?",
        "Quero fechar!",
    ]
    .iter()
    .enumerate()
    {
        h.pipeline
            .process(&InboundJob {
                phone: "5511999990001".to_string(),
                message: text.to_string(),
                push_name: Some("Pr. João".to_string()),
                message_id: format!("funnel-{i}"),
                timestamp: 1_700_000_000 + i as i64,
            })
            .await
            .unwrap();
    }

    let lead = leads::get_by_phone(&h.db, "5511999990001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.status, LeadStatus::Negotiating);
    assert_eq!(lead.temperature, Temperature::Hot);
    // Turn 3 was handled by bdr (status was qualified when routed); the
    // closer hand-off lands on the next turn.
    assert_eq!(lead.assigned_agent, AgentStage::Bdr);
    assert_eq!(
        lead.metadata.get("instagram").and_then(|v| v.as_str()),
        Some("@igrejaviva")
    );

    // Market analysis was stored once at the sdr stage and reused.
    let analysis =
        ekkle_storage::queries::analyses::latest(&h.db, &lead.id, ekkle_market::ANALYSIS_TYPE)
            .await
            .unwrap()
            .expect("analysis stored");
    assert!(analysis.competitor_count >= 8, "metro address heuristics");

    assert_eq!(h.messaging.sent().await.len(), 3);
    let executions = executions::for_lead(&h.db, &lead.id, 10).await.unwrap();
    assert_eq!(executions.len(), 3);
    assert!(
        executions
            .iter()
            .all(|e| e.status == ExecutionStatus::Completed)
    );
}
