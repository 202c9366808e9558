// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Ekkle workspace.
//!
//! Enums are closed string sets persisted as TEXT; `strum` provides the
//! Display/FromStr round-trip used at the storage boundary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Free-form collected facts attached to a lead (address, instagram, ...).
///
/// Stored as a JSON object in a TEXT column.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Funnel stage of a lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Negotiating,
    Won,
    Lost,
}

/// Coarse interest level, independent of funnel stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Cold,
    Warm,
    Hot,
}

/// Sales persona handling a lead.
///
/// The closing stage is canonically `closer` (the source system drifted
/// between "ae" and "closer" for the same role).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgentStage {
    Sdr,
    Bdr,
    Closer,
}

/// Closed-set classification of an inbound message's purpose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Pricing,
    Features,
    Technical,
    Objection,
    Closing,
    Support,
    OffHours,
    Unknown,
}

/// Direction of a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Lifecycle status of an agent execution record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Started,
    Completed,
    Failed,
}

/// Opportunity level produced by market analysis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Opportunity {
    Low,
    Medium,
    High,
}

/// A prospective customer, unique per phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub phone: String,
    pub name: Option<String>,
    pub church_name: Option<String>,
    pub status: LeadStatus,
    pub temperature: Temperature,
    pub assigned_agent: AgentStage,
    pub metadata: Metadata,
    pub created_at: String,
    pub updated_at: String,
}

/// One inbound or outbound conversation message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub lead_id: String,
    pub message: String,
    pub direction: Direction,
    pub agent_name: AgentStage,
    pub intent_detected: Intent,
    /// Provider-assigned message id; deduplication key for inbound messages.
    pub provider_message_id: Option<String>,
    pub metadata: Metadata,
    pub created_at: String,
}

/// Audit record for a single agent invocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    pub id: String,
    pub lead_id: String,
    pub agent_name: AgentStage,
    pub input_message: String,
    pub output_message: Option<String>,
    pub intent_detected: Option<Intent>,
    pub tokens_used: i64,
    pub execution_time_ms: i64,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// Rolling conversation summary; at most one row per lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub lead_id: String,
    pub summary: String,
    pub messages_count: i64,
    pub last_message_id: Option<String>,
    pub key_points: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Cached market analysis for a lead's region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAnalysisRecord {
    pub id: String,
    pub lead_id: String,
    pub analysis_type: String,
    pub address: Option<String>,
    pub instagram: Option<String>,
    pub competitor_count: i64,
    pub digital_score: i64,
    pub opportunity: Opportunity,
    pub raw_data: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload of one queued inbound-message job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundJob {
    pub phone: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    /// Provider message id; doubles as the job's idempotency key.
    pub message_id: String,
    pub timestamp: i64,
}

/// A row in the durable job queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub job_key: String,
    /// Partition key (the lead's phone); at most one in-flight entry per
    /// group, consumed in id order.
    pub group_key: Option<String>,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub available_at: String,
    pub locked_until: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Queue depth counters for the statistics endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueueStats {
    pub waiting: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
    pub delayed: i64,
}

// --- Completion types ---

/// Role tag on a chat-completion message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A request to the chat-completion API.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A response from the chat-completion API.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub content: String,
    pub tokens_used: i64,
    pub finish_reason: Option<String>,
}

// --- Messaging types ---

/// Outcome of a message delivery attempt.
///
/// Delivery-level failures are reported in the receipt rather than as
/// errors; only client construction and serialization problems surface as
/// `EkkleError`.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl SendReceipt {
    pub fn ok(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_round_trip_through_strings() {
        for status in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::Negotiating,
            LeadStatus::Won,
            LeadStatus::Lost,
        ] {
            let s = status.to_string();
            assert_eq!(LeadStatus::from_str(&s).unwrap(), status);
        }
        for intent in [
            Intent::Greeting,
            Intent::Pricing,
            Intent::Features,
            Intent::Technical,
            Intent::Objection,
            Intent::Closing,
            Intent::Support,
            Intent::OffHours,
            Intent::Unknown,
        ] {
            let s = intent.to_string();
            assert_eq!(Intent::from_str(&s).unwrap(), intent);
        }
    }

    #[test]
    fn off_hours_serializes_snake_case() {
        assert_eq!(Intent::OffHours.to_string(), "off_hours");
        assert_eq!(
            serde_json::to_string(&Intent::OffHours).unwrap(),
            "\"off_hours\""
        );
    }

    #[test]
    fn inbound_job_round_trips_json() {
        let job = InboundJob {
            phone: "5511999990001".to_string(),
            message: "Quero saber o preço".to_string(),
            push_name: Some("Pr. João".to_string()),
            message_id: "abc-1".to_string(),
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&job).unwrap();
        let back: InboundJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phone, job.phone);
        assert_eq!(back.message_id, "abc-1");
        assert_eq!(back.push_name.as_deref(), Some("Pr. João"));
    }

    #[test]
    fn push_name_is_optional_in_job_payload() {
        let job: InboundJob = serde_json::from_str(
            r#"{"phone":"5511","message":"oi","message_id":"m1","timestamp":0}"#,
        )
        .unwrap();
        assert!(job.push_name.is_none());
    }
}
