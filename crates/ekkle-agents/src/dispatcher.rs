// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message dispatch state machine.
//!
//! Orchestrates one agent turn: business-hours gate, intent classification,
//! routing, fact extraction, conditional market analysis, context assembly,
//! the persona completion call, and the status/temperature transition. The
//! caller (worker pipeline) owns all persistence and delivery.
//!
//! Failure semantics: helper calls (classification, extraction, analysis,
//! context) degrade internally and never fail the dispatch; only the final
//! persona completion call propagates its error, so the job-level retry can
//! re-attempt the whole pipeline.

use std::sync::Arc;

use ekkle_config::model::{AgentConfig, HoursConfig, MemoryConfig};
use ekkle_core::types::{ChatMessage, CompletionRequest, Lead, Metadata};
use ekkle_core::{AgentStage, Clock, CompletionAdapter, EkkleError, Intent};
use ekkle_market::{AnalysisResult, MarketAnalysisService};
use ekkle_memory::{ContextBuilder, extract_lead_facts, merge_metadata};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::hours::BusinessHours;
use crate::intent::classify_intent;
use crate::personas::{PersonaVars, persona_prompt};
use crate::router;

/// Result of one dispatch turn, to be persisted and delivered by the caller.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub reply: String,
    pub intent: Intent,
    /// Persona that handled (or is attributed to) this turn.
    pub agent: AgentStage,
    pub tokens_used: i64,
    pub new_status: Option<ekkle_core::LeadStatus>,
    pub new_temperature: Option<ekkle_core::Temperature>,
    /// Merged metadata, present when extraction added or changed fields.
    pub merged_metadata: Option<Metadata>,
    /// True when the off-hours auto-reply path was taken.
    pub off_hours: bool,
}

/// Routes inbound messages to the correct persona and drives the
/// completion call for the reply.
pub struct Dispatcher {
    completion: Arc<dyn CompletionAdapter>,
    context: ContextBuilder,
    market: MarketAnalysisService,
    clock: Arc<dyn Clock>,
    hours: BusinessHours,
    agent_config: AgentConfig,
    memory_config: MemoryConfig,
    off_hours_rng: Mutex<StdRng>,
}

impl Dispatcher {
    pub fn new(
        completion: Arc<dyn CompletionAdapter>,
        context: ContextBuilder,
        market: MarketAnalysisService,
        clock: Arc<dyn Clock>,
        hours_config: HoursConfig,
        agent_config: AgentConfig,
        memory_config: MemoryConfig,
    ) -> Self {
        Self::with_rng(
            completion,
            context,
            market,
            clock,
            hours_config,
            agent_config,
            memory_config,
            StdRng::from_entropy(),
        )
    }

    /// Deterministic off-hours reply selection for tests.
    #[allow(clippy::too_many_arguments)]
    pub fn seeded(
        completion: Arc<dyn CompletionAdapter>,
        context: ContextBuilder,
        market: MarketAnalysisService,
        clock: Arc<dyn Clock>,
        hours_config: HoursConfig,
        agent_config: AgentConfig,
        memory_config: MemoryConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            completion,
            context,
            market,
            clock,
            hours_config,
            agent_config,
            memory_config,
            StdRng::seed_from_u64(seed),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn with_rng(
        completion: Arc<dyn CompletionAdapter>,
        context: ContextBuilder,
        market: MarketAnalysisService,
        clock: Arc<dyn Clock>,
        hours_config: HoursConfig,
        agent_config: AgentConfig,
        memory_config: MemoryConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            completion,
            context,
            market,
            clock,
            hours: BusinessHours::new(hours_config),
            agent_config,
            memory_config,
            off_hours_rng: Mutex::new(rng),
        }
    }

    /// The fixed apology used when the pipeline fails mid-flight.
    pub fn fallback_reply(&self) -> &str {
        &self.agent_config.fallback_reply
    }

    /// Run one dispatch turn for an inbound message.
    pub async fn dispatch(
        &self,
        lead: &Lead,
        message: &str,
    ) -> Result<DispatchOutcome, EkkleError> {
        // Outside business hours: auto-reply and skip agent invocation
        // entirely, regardless of message content.
        if !self.hours.is_within(self.clock.now_utc()) {
            let reply = self.pick_off_hours_reply().await;
            info!(lead_id = %lead.id, "outside business hours, sending auto-reply");
            return Ok(DispatchOutcome {
                reply,
                intent: Intent::OffHours,
                agent: lead.assigned_agent,
                tokens_used: 0,
                new_status: None,
                new_temperature: None,
                merged_metadata: None,
                off_hours: true,
            });
        }

        let intent = classify_intent(self.completion.as_ref(), message).await;
        let agent = router::route(lead.status, lead.temperature);
        debug!(lead_id = %lead.id, %intent, %agent, status = %lead.status, "routing message");

        // Best-effort structured fact extraction; merged non-destructively.
        let extracted =
            extract_lead_facts(self.completion.as_ref(), message, &self.memory_config).await;
        let merged_metadata = if extracted.is_empty() {
            None
        } else {
            Some(merge_metadata(&lead.metadata, &extracted))
        };
        let effective_metadata = merged_metadata.as_ref().unwrap_or(&lead.metadata);

        let metadata_str = |metadata: &Metadata, key: &str| -> Option<String> {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        // First-time geographic/social data at the SDR stage kicks off the
        // market analysis; the result is cached for the BDR stage.
        let mut analysis: Option<AnalysisResult> = None;
        if agent == AgentStage::Sdr
            && MarketAnalysisService::should_trigger(&lead.metadata, &extracted)
        {
            let address = metadata_str(effective_metadata, "address");
            let instagram = metadata_str(effective_metadata, "instagram");
            analysis = Some(
                self.market
                    .analyze(lead, address.as_deref(), instagram.as_deref())
                    .await,
            );
        }

        // The analysis block is injected only when addressing the BDR stage.
        if agent == AgentStage::Bdr {
            let address = metadata_str(effective_metadata, "address");
            let instagram = metadata_str(effective_metadata, "instagram");
            analysis = Some(
                self.market
                    .analyze(lead, address.as_deref(), instagram.as_deref())
                    .await,
            );
        }

        // Context is assembled against the merged metadata so freshly
        // collected facts show up in this very turn.
        let mut context_lead = lead.clone();
        if let Some(merged) = &merged_metadata {
            context_lead.metadata = merged.clone();
        }
        let context = self.context.build(&context_lead).await;

        let mut context_block = context.context_prompt;
        if agent == AgentStage::Bdr {
            if let Some(analysis) = &analysis {
                context_block.push_str("\n\n");
                context_block.push_str(&ekkle_market::format_for_prompt(analysis));
            }
        }

        let persona = persona_prompt(
            agent,
            &PersonaVars {
                lead_name: lead.name.as_deref(),
                church_name: lead.church_name.as_deref(),
            },
        );

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(persona),
                ChatMessage::system(context_block),
                ChatMessage::user(message),
            ],
            temperature: self.agent_config.reply_temperature,
            max_tokens: self.agent_config.reply_max_tokens,
        };

        // The one call that may fail the dispatch; the caller sends the
        // fallback and re-throws for the job-level retry.
        let result = self.completion.complete(request).await?;

        let transition = router::apply_transitions(lead.status, agent, intent);

        info!(
            lead_id = %lead.id,
            %intent,
            %agent,
            tokens_used = result.tokens_used,
            transitioned = transition.is_some(),
            "dispatch completed"
        );

        Ok(DispatchOutcome {
            reply: result.content,
            intent,
            agent,
            tokens_used: result.tokens_used,
            new_status: transition.map(|t| t.status),
            new_temperature: transition.map(|t| t.temperature),
            merged_metadata,
            off_hours: false,
        })
    }

    async fn pick_off_hours_reply(&self) -> String {
        let replies = &self.agent_config.off_hours_replies;
        let mut rng = self.off_hours_rng.lock().await;
        let index = rng.gen_range(0..replies.len());
        replies[index].clone()
    }
}
