// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message pipeline executed for each dequeued job.
//!
//! Order: dedup check, lead get-or-create, name backfill, inbound persist,
//! execution record, agent dispatch, execution update, outbound persist,
//! lead update, paced delivery.
//!
//! A dispatch failure sends the fixed fallback reply, marks the execution
//! failed, and re-propagates the error so the queue retries the job.
//! Delivery failure after a fully processed pipeline is logged but does not
//! fail the job: the inbound dedup check would make a retry a no-op anyway.

use std::sync::Arc;

use ekkle_agents::Dispatcher;
use ekkle_core::types::{Conversation, Direction, InboundJob, Intent, Lead, Metadata};
use ekkle_core::{EkkleError, MessagingAdapter};
use ekkle_storage::Database;
use ekkle_storage::queries::{conversations, executions, leads, now_ts};
use ekkle_whatsapp::{HumanPacer, deliver_with_pacing};
use tracing::{error, info, warn};

/// Drives one inbound message through store, dispatch, and delivery.
pub struct Pipeline {
    db: Arc<Database>,
    dispatcher: Arc<Dispatcher>,
    messaging: Arc<dyn MessagingAdapter>,
    pacer: Arc<HumanPacer>,
}

impl Pipeline {
    pub fn new(
        db: Arc<Database>,
        dispatcher: Arc<Dispatcher>,
        messaging: Arc<dyn MessagingAdapter>,
        pacer: Arc<HumanPacer>,
    ) -> Self {
        Self {
            db,
            dispatcher,
            messaging,
            pacer,
        }
    }

    /// Process one job end-to-end.
    pub async fn process(&self, job: &InboundJob) -> Result<(), EkkleError> {
        let started = std::time::Instant::now();

        // Idempotency: a provider message id we already stored means this
        // job (or a duplicate webhook delivery) was processed before.
        if conversations::provider_message_exists(&self.db, &job.message_id).await? {
            info!(
                phone = %job.phone,
                message_id = %job.message_id,
                "duplicate message, skipping"
            );
            return Ok(());
        }

        let (mut lead, is_new) =
            leads::create_or_get(&self.db, &job.phone, job.push_name.as_deref()).await?;
        info!(lead_id = %lead.id, is_new, phone = %job.phone, "lead resolved");

        // Backfill the display name when the provider supplies one and the
        // lead has none yet.
        if let Some(push_name) = &job.push_name {
            if lead.name.is_none() {
                leads::update(
                    &self.db,
                    &lead.id,
                    ekkle_storage::LeadPatch {
                        name: Some(push_name.clone()),
                        ..Default::default()
                    },
                )
                .await?;
                lead.name = Some(push_name.clone());
            }
        }

        let mut inbound_metadata = Metadata::new();
        inbound_metadata.insert("message_id".into(), job.message_id.clone().into());
        inbound_metadata.insert("timestamp".into(), job.timestamp.into());
        conversations::insert(
            &self.db,
            &Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                lead_id: lead.id.clone(),
                message: job.message.clone(),
                direction: Direction::Inbound,
                agent_name: lead.assigned_agent,
                intent_detected: Intent::Unknown,
                provider_message_id: Some(job.message_id.clone()),
                metadata: inbound_metadata,
                created_at: now_ts(),
            },
        )
        .await?;

        let execution_id =
            executions::start(&self.db, &lead.id, lead.assigned_agent, &job.message).await?;

        match self.dispatcher.dispatch(&lead, &job.message).await {
            Ok(outcome) => {
                let elapsed_ms = started.elapsed().as_millis() as i64;
                executions::complete(
                    &self.db,
                    &execution_id,
                    &outcome.reply,
                    outcome.intent,
                    outcome.tokens_used,
                    elapsed_ms,
                )
                .await?;

                let mut outbound_metadata = Metadata::new();
                outbound_metadata.insert("execution_id".into(), execution_id.clone().into());
                conversations::insert(
                    &self.db,
                    &Conversation {
                        id: uuid::Uuid::new_v4().to_string(),
                        lead_id: lead.id.clone(),
                        message: outcome.reply.clone(),
                        direction: Direction::Outbound,
                        agent_name: outcome.agent,
                        intent_detected: outcome.intent,
                        provider_message_id: None,
                        metadata: outbound_metadata,
                        created_at: now_ts(),
                    },
                )
                .await?;

                self.persist_lead_changes(&lead, &outcome).await?;

                let receipt =
                    deliver_with_pacing(self.messaging.as_ref(), &self.pacer, &job.phone, &outcome.reply)
                        .await?;
                if !receipt.success {
                    // Processed but undelivered: log and keep the job
                    // successful, a retry could never re-send past dedup.
                    error!(
                        phone = %job.phone,
                        error = ?receipt.error,
                        "failed to deliver reply"
                    );
                }

                info!(
                    lead_id = %lead.id,
                    intent = %outcome.intent,
                    agent = %outcome.agent,
                    execution_time_ms = elapsed_ms,
                    delivered = receipt.success,
                    "message processed"
                );
                Ok(())
            }
            Err(e) => {
                let elapsed_ms = started.elapsed().as_millis() as i64;
                error!(lead_id = %lead.id, error = %e, "dispatch failed, sending fallback");

                if let Err(update_err) =
                    executions::fail(&self.db, &execution_id, &e.to_string(), elapsed_ms).await
                {
                    warn!(error = %update_err, "failed to record execution failure");
                }

                let fallback = self.dispatcher.fallback_reply().to_string();
                let mut fallback_metadata = Metadata::new();
                fallback_metadata.insert("execution_id".into(), execution_id.into());
                fallback_metadata.insert("fallback".into(), true.into());
                if let Err(insert_err) = conversations::insert(
                    &self.db,
                    &Conversation {
                        id: uuid::Uuid::new_v4().to_string(),
                        lead_id: lead.id.clone(),
                        message: fallback.clone(),
                        direction: Direction::Outbound,
                        agent_name: lead.assigned_agent,
                        intent_detected: Intent::Unknown,
                        provider_message_id: None,
                        metadata: fallback_metadata,
                        created_at: now_ts(),
                    },
                )
                .await
                {
                    warn!(error = %insert_err, "failed to persist fallback reply");
                }

                if let Err(send_err) =
                    deliver_with_pacing(self.messaging.as_ref(), &self.pacer, &job.phone, &fallback)
                        .await
                {
                    warn!(error = %send_err, "failed to send fallback reply");
                }

                // Re-throw so the queue's retry/backoff takes over.
                Err(e)
            }
        }
    }

    async fn persist_lead_changes(
        &self,
        lead: &Lead,
        outcome: &ekkle_agents::DispatchOutcome,
    ) -> Result<(), EkkleError> {
        let mut patch = ekkle_storage::LeadPatch {
            status: outcome.new_status,
            temperature: outcome.new_temperature,
            metadata: outcome.merged_metadata.clone(),
            ..Default::default()
        };
        // Hand-off: routing picked a different persona than the stored
        // assignment (derived from the lead's current status).
        if !outcome.off_hours && outcome.agent != lead.assigned_agent {
            patch.assigned_agent = Some(outcome.agent);
            info!(
                lead_id = %lead.id,
                from = %lead.assigned_agent,
                to = %outcome.agent,
                "lead transferred to new agent"
            );
        }
        if !patch.is_empty() {
            leads::update(&self.db, &lead.id, patch).await?;
        }
        Ok(())
    }
}
