// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation message operations.
//!
//! Rows are immutable once created. The provider message id column is the
//! deduplication key consulted at the top of the worker pipeline.

use ekkle_core::EkkleError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Conversation;
use crate::queries::{parse_enum, parse_json};

fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let direction: String = row.get(3)?;
    let agent_name: String = row.get(4)?;
    let intent: String = row.get(5)?;
    let metadata: String = row.get(7)?;
    Ok(Conversation {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        message: row.get(2)?,
        direction: parse_enum(3, &direction)?,
        agent_name: parse_enum(4, &agent_name)?,
        intent_detected: parse_enum(5, &intent)?,
        provider_message_id: row.get(6)?,
        metadata: parse_json(7, &metadata)?,
        created_at: row.get(8)?,
    })
}

const CONVERSATION_COLUMNS: &str = "id, lead_id, message, direction, agent_name, \
                                    intent_detected, provider_message_id, metadata, created_at";

/// Insert a new conversation message.
pub async fn insert(db: &Database, conversation: &Conversation) -> Result<(), EkkleError> {
    let c = conversation.clone();
    db.connection()
        .call(move |conn| {
            let metadata = serde_json::to_string(&c.metadata)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            conn.execute(
                "INSERT INTO conversations
                     (id, lead_id, message, direction, agent_name, intent_detected,
                      provider_message_id, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    c.id,
                    c.lead_id,
                    c.message,
                    c.direction.to_string(),
                    c.agent_name.to_string(),
                    c.intent_detected.to_string(),
                    c.provider_message_id,
                    metadata,
                    c.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Last `limit` messages for a lead, returned in chronological order.
pub async fn recent(
    db: &Database,
    lead_id: &str,
    limit: i64,
) -> Result<Vec<Conversation>, EkkleError> {
    let lead_id = lead_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE lead_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![lead_id, limit], conversation_from_row)?;
            let mut messages: Vec<Conversation> = rows.collect::<Result<_, _>>()?;
            // Chronological order, oldest first.
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Total number of stored messages for a lead.
pub async fn count(db: &Database, lead_id: &str) -> Result<i64, EkkleError> {
    let lead_id = lead_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE lead_id = ?1",
                params![lead_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Whether a message with this provider id has already been stored.
pub async fn provider_message_exists(
    db: &Database,
    provider_message_id: &str,
) -> Result<bool, EkkleError> {
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE provider_message_id = ?1",
                params![provider_message_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}
