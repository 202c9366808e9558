// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context assembly.
//!
//! Produces a single bounded text context for the completion call: lead
//! attributes, collected metadata, an optional rolling summary, and the last
//! K messages. Summarization triggers when history grows past a threshold or
//! drifts far enough from the last summary.
//!
//! Context building never fails: any storage or completion error degrades to
//! a minimal lead-info context with an explicit note that history could not
//! be loaded.

use std::sync::Arc;

use ekkle_config::model::MemoryConfig;
use ekkle_core::types::{
    ChatMessage, CompletionRequest, Conversation, ConversationSummary, Direction, Lead,
};
use ekkle_core::{CompletionAdapter, EkkleError};
use serde::Deserialize;
use tracing::{info, warn};

use ekkle_storage::Database;
use ekkle_storage::queries::{conversations, summaries};

const SUMMARIZER_INSTRUCTION: &str = "You summarize sales conversations with church leaders.\n\
Analyze the conversation below and produce:\n\
1. A concise summary (max 200 words) of the main points\n\
2. A list of extracted key points (max 5 items)\n\
\n\
Respond ONLY with JSON in this shape:\n\
{\"summary\": \"...\", \"key_points\": [\"...\", \"...\"]}";

/// Structured result expected from the summarization call.
#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
}

/// Assembled context for one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub recent_messages: Vec<Conversation>,
    pub summary: Option<ConversationSummary>,
    pub total_messages: i64,
    pub context_prompt: String,
}

/// Builds bounded conversation context, maintaining the rolling summary.
pub struct ContextBuilder {
    db: Arc<Database>,
    completion: Arc<dyn CompletionAdapter>,
    config: MemoryConfig,
}

impl ContextBuilder {
    pub fn new(
        db: Arc<Database>,
        completion: Arc<dyn CompletionAdapter>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            db,
            completion,
            config,
        }
    }

    /// Whether a (re)summarization should fire.
    ///
    /// Fires when no summary exists and history exceeds the threshold, or
    /// when the drift since the stored summary exceeds the drift threshold.
    /// Both comparisons are strict.
    pub fn should_generate_summary(
        config: &MemoryConfig,
        total_messages: i64,
        existing: Option<&ConversationSummary>,
    ) -> bool {
        match existing {
            None => total_messages > config.summary_threshold,
            Some(summary) => total_messages - summary.messages_count > config.drift_threshold,
        }
    }

    /// Assemble the context for a lead. Never fails; degrades to a minimal
    /// context on any error.
    pub async fn build(&self, lead: &Lead) -> AgentContext {
        match self.try_build(lead).await {
            Ok(context) => context,
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "context build failed, using minimal context");
                AgentContext {
                    recent_messages: Vec::new(),
                    summary: None,
                    total_messages: 0,
                    context_prompt: minimal_context_prompt(lead),
                }
            }
        }
    }

    async fn try_build(&self, lead: &Lead) -> Result<AgentContext, EkkleError> {
        let total_messages = conversations::count(&self.db, &lead.id).await?;
        let recent_messages =
            conversations::recent(&self.db, &lead.id, self.config.recent_limit).await?;
        let mut summary = summaries::get(&self.db, &lead.id).await?;

        if Self::should_generate_summary(&self.config, total_messages, summary.as_ref()) {
            info!(lead_id = %lead.id, total_messages, "generating conversation summary");
            summary = self
                .refresh_summary(lead, total_messages, &recent_messages)
                .await
                .or(summary);
        }

        let context_prompt =
            build_context_prompt(lead, &recent_messages, summary.as_ref(), total_messages);

        Ok(AgentContext {
            recent_messages,
            summary,
            total_messages,
            context_prompt,
        })
    }

    /// Summarize recent history and upsert the lead's summary row.
    ///
    /// A completion failure leaves the stored summary untouched and returns
    /// `None` so the caller keeps whatever it had.
    async fn refresh_summary(
        &self,
        lead: &Lead,
        total_messages: i64,
        recent_messages: &[Conversation],
    ) -> Option<ConversationSummary> {
        let history =
            match conversations::recent(&self.db, &lead.id, self.config.summary_fetch_limit).await
            {
                Ok(history) => history,
                Err(e) => {
                    warn!(lead_id = %lead.id, error = %e, "failed to load history for summary");
                    return None;
                }
            };

        let transcript = history
            .iter()
            .map(|c| {
                let role = match c.direction {
                    Direction::Inbound => "Customer",
                    Direction::Outbound => "Agent",
                };
                format!("{role}: {}", c.message)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let lead_block = format!(
            "Lead info:\n- Name: {}\n- Church: {}\n- Status: {}",
            lead.name.as_deref().unwrap_or("Not provided"),
            lead.church_name.as_deref().unwrap_or("Not provided"),
            lead.status,
        );

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(format!("{SUMMARIZER_INSTRUCTION}\n\n{lead_block}")),
                ChatMessage::user(transcript),
            ],
            temperature: self.config.summary_temperature,
            max_tokens: self.config.summary_max_tokens,
        };

        let result = match self.completion.complete(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "summary generation failed");
                return None;
            }
        };

        // Non-JSON output degrades to a raw-text summary with no key points.
        let (summary_text, key_points) =
            match serde_json::from_str::<SummaryPayload>(result.content.trim()) {
                Ok(payload) if !payload.summary.is_empty() => {
                    (payload.summary, payload.key_points)
                }
                _ => (result.content, Vec::new()),
            };

        let last_message_id = recent_messages.last().map(|m| m.id.as_str());
        match summaries::upsert(
            &self.db,
            &lead.id,
            &summary_text,
            total_messages,
            last_message_id,
            &key_points,
        )
        .await
        {
            Ok(stored) => {
                info!(lead_id = %lead.id, messages_count = total_messages, "conversation summary saved");
                Some(stored)
            }
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "failed to save summary");
                None
            }
        }
    }
}

/// Render the ordered context sections.
fn build_context_prompt(
    lead: &Lead,
    recent_messages: &[Conversation],
    summary: Option<&ConversationSummary>,
    total_messages: i64,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "=== LEAD INFO ===\n\
         Name: {}\n\
         Church: {}\n\
         Phone: {}\n\
         Status: {}\n\
         Temperature: {}\n\
         Assigned agent: {}\n\
         Total messages: {total_messages}",
        lead.name.as_deref().unwrap_or("Not provided"),
        lead.church_name.as_deref().unwrap_or("Not provided"),
        lead.phone,
        lead.status,
        lead.temperature,
        lead.assigned_agent,
    ));

    if !lead.metadata.is_empty() {
        let collected = lead
            .metadata
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("- {k}: {s}"),
                None => format!("- {k}: {v}"),
            })
            .collect::<Vec<_>>()
            .join("\n");
        if !collected.is_empty() {
            parts.push(format!("=== COLLECTED DATA ===\n{collected}"));
        }
    }

    if let Some(summary) = summary {
        let mut block = format!("=== CONVERSATION SUMMARY ===\n{}", summary.summary);
        if !summary.key_points.is_empty() {
            let points = summary
                .key_points
                .iter()
                .map(|p| format!("- {p}"))
                .collect::<Vec<_>>()
                .join("\n");
            block.push_str(&format!("\nKey points:\n{points}"));
        }
        parts.push(block);
    }

    parts.push(format!(
        "=== LAST {} MESSAGES ===\n{}",
        recent_messages.len(),
        format_messages(recent_messages)
    ));

    parts.join("\n\n")
}

fn format_messages(messages: &[Conversation]) -> String {
    if messages.is_empty() {
        return "No previous messages.".to_string();
    }
    messages
        .iter()
        .map(|c| {
            let role = match c.direction {
                Direction::Inbound => "CUSTOMER",
                Direction::Outbound => "AGENT",
            };
            format!("[{}] {role}: {}", c.created_at, c.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lead-info-only context used when history cannot be loaded.
fn minimal_context_prompt(lead: &Lead) -> String {
    format!(
        "=== LEAD INFO ===\n\
         Name: {}\n\
         Church: {}\n\
         Phone: {}\n\
         Status: {}\n\
         Temperature: {}\n\n\
         (Conversation history could not be loaded.)",
        lead.name.as_deref().unwrap_or("Not provided"),
        lead.church_name.as_deref().unwrap_or("Not provided"),
        lead.phone,
        lead.status,
        lead.temperature,
    )
}
