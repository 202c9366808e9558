// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: tempfile-backed database and seeded leads.

use std::sync::Arc;

use ekkle_core::types::{AgentStage, Conversation, Direction, Intent, Lead, Metadata};
use ekkle_storage::Database;
use ekkle_storage::queries::{conversations, leads};

/// Open a fresh migrated database in a temp directory.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn open_temp_db() -> (Arc<Database>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.db");
    let db = Database::open(db_path.to_str().expect("utf-8 path"))
        .await
        .expect("open test db");
    (Arc::new(db), dir)
}

/// Create (or fetch) a lead for the given phone.
pub async fn seed_lead(db: &Database, phone: &str) -> Lead {
    let (lead, _) = leads::create_or_get(db, phone, None)
        .await
        .expect("seed lead");
    lead
}

/// Insert `count` alternating inbound/outbound messages for a lead.
pub async fn seed_messages(db: &Database, lead_id: &str, count: usize) {
    for i in 0..count {
        let direction = if i % 2 == 0 {
            Direction::Inbound
        } else {
            Direction::Outbound
        };
        let message = Conversation {
            id: format!("seed-{lead_id}-{i}"),
            lead_id: lead_id.to_string(),
            message: format!("seeded message {i}"),
            direction,
            agent_name: AgentStage::Sdr,
            intent_detected: Intent::Unknown,
            provider_message_id: Some(format!("seed-prov-{lead_id}-{i}")),
            metadata: Metadata::new(),
            created_at: format!("2026-01-01T00:{:02}:{:02}.000Z", i / 60, i % 60),
        };
        conversations::insert(db, &message).await.expect("seed message");
    }
}
