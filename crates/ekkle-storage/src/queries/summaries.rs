// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling conversation summaries, one row per lead.
//!
//! The unique constraint on `lead_id` makes the save an upsert: conflict
//! resolution is update-in-place.

use ekkle_core::EkkleError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::ConversationSummary;
use crate::queries::{now_ts, parse_json};

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationSummary> {
    let key_points: String = row.get(5)?;
    Ok(ConversationSummary {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        summary: row.get(2)?,
        messages_count: row.get(3)?,
        last_message_id: row.get(4)?,
        key_points: parse_json(5, &key_points)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const SUMMARY_COLUMNS: &str = "id, lead_id, summary, messages_count, last_message_id, \
                               key_points, created_at, updated_at";

/// Fetch the summary for a lead, if one exists.
pub async fn get(db: &Database, lead_id: &str) -> Result<Option<ConversationSummary>, EkkleError> {
    let lead_id = lead_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUMMARY_COLUMNS} FROM conversation_summaries WHERE lead_id = ?1"
            ))?;
            match stmt.query_row(params![lead_id], summary_from_row) {
                Ok(summary) => Ok(Some(summary)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the lead's summary, returning the stored row.
pub async fn upsert(
    db: &Database,
    lead_id: &str,
    summary: &str,
    messages_count: i64,
    last_message_id: Option<&str>,
    key_points: &[String],
) -> Result<ConversationSummary, EkkleError> {
    let lead_id = lead_id.to_string();
    let summary = summary.to_string();
    let last_message_id = last_message_id.map(|s| s.to_string());
    let key_points = key_points.to_vec();
    db.connection()
        .call(move |conn| {
            let key_points_json = serde_json::to_string(&key_points)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            let now = now_ts();
            conn.execute(
                "INSERT INTO conversation_summaries
                     (id, lead_id, summary, messages_count, last_message_id, key_points,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(lead_id) DO UPDATE SET
                     summary = excluded.summary,
                     messages_count = excluded.messages_count,
                     last_message_id = excluded.last_message_id,
                     key_points = excluded.key_points,
                     updated_at = excluded.updated_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    lead_id,
                    summary,
                    messages_count,
                    last_message_id,
                    key_points_json,
                    now,
                ],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUMMARY_COLUMNS} FROM conversation_summaries WHERE lead_id = ?1"
            ))?;
            stmt.query_row(params![lead_id], summary_from_row)
        })
        .await
        .map_err(map_tr_err)
}
