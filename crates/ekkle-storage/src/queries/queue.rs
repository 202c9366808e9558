// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue operations for crash-safe message processing.
//!
//! Lifecycle: `pending` -> `processing` -> `completed` | back to `pending`
//! with exponential backoff | `failed` after attempt exhaustion. The unique
//! `job_key` makes enqueueing idempotent: a duplicate key resolves to the
//! existing entry instead of erroring.
//!
//! Entries carry an optional `group_key` (the lead's phone). Dequeue hands
//! out at most one entry per group at a time and always the lowest id
//! first, giving strict per-lead ordering without cross-group head-of-line
//! blocking.

use ekkle_core::EkkleError;
use ekkle_core::types::{QueueEntry, QueueStats};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Queue consumed by the WhatsApp worker pool.
pub const WHATSAPP_INCOMING: &str = "whatsapp:incoming";

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        job_key: row.get(2)?,
        group_key: row.get(3)?,
        payload: row.get(4)?,
        status: row.get(5)?,
        attempts: row.get(6)?,
        max_attempts: row.get(7)?,
        available_at: row.get(8)?,
        locked_until: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

const ENTRY_COLUMNS: &str = "id, queue_name, job_key, group_key, payload, status, attempts, \
                             max_attempts, available_at, locked_until, created_at, updated_at";

/// Enqueue a new item under the caller-supplied idempotency key.
///
/// Returns `(entry_id, created)`. When an entry with the same `job_key`
/// already exists the insert is a no-op and the existing id is returned with
/// `created = false`.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    job_key: &str,
    group_key: Option<&str>,
    payload: &str,
    max_attempts: i32,
) -> Result<(i64, bool), EkkleError> {
    let queue_name = queue_name.to_string();
    let job_key = job_key.to_string();
    let group_key = group_key.map(|s| s.to_string());
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO queue (queue_name, job_key, group_key, payload, max_attempts)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![queue_name, job_key, group_key, payload, max_attempts],
            )?;
            if inserted == 1 {
                Ok((conn.last_insert_rowid(), true))
            } else {
                let id: i64 = conn.query_row(
                    "SELECT id FROM queue WHERE job_key = ?1",
                    params![job_key],
                    |row| row.get(0),
                )?;
                Ok((id, false))
            }
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Dequeue the next ready entry from the named queue.
///
/// Atomically selects the oldest pending entry whose backoff delay has
/// elapsed and marks it `processing` with a lock of `lock_secs`. An entry
/// with a group key is skipped while another entry of the same group is in
/// flight or queued ahead of it, so groups are consumed strictly in order.
/// Returns `None` if nothing is ready.
pub async fn dequeue(
    db: &Database,
    queue_name: &str,
    lock_secs: u64,
) -> Result<Option<QueueEntry>, EkkleError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            // Use a transaction to atomically find + update the next ready entry.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM queue AS q
                     WHERE q.queue_name = ?1 AND q.status = 'pending'
                       AND q.available_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                       AND (q.group_key IS NULL OR NOT EXISTS (
                               SELECT 1 FROM queue AS p
                               WHERE p.queue_name = q.queue_name
                                 AND p.group_key = q.group_key
                                 AND (p.status = 'processing'
                                      OR (p.status = 'pending' AND p.id < q.id))
                           ))
                     ORDER BY q.id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row(params![queue_name], entry_from_row)
            };

            match result {
                Ok(entry) => {
                    tx.execute(
                        "UPDATE queue SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![entry.id, format!("+{lock_secs} seconds")],
                    )?;
                    tx.commit()?;

                    Ok(Some(QueueEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge successful processing of a queue entry.
pub async fn ack(db: &Database, id: i64) -> Result<(), EkkleError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Mark a queue entry as failed.
///
/// Increments attempts. At `max_attempts` the entry is parked in the failed
/// set; otherwise it goes back to `pending` with exponential backoff
/// (`backoff_base_ms * 2^(attempt-1)`).
pub async fn fail(db: &Database, id: i64, backoff_base_ms: u64) -> Result<(), EkkleError> {
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            if new_attempts >= max_attempts {
                conn.execute(
                    "UPDATE queue SET status = 'failed', attempts = ?1,
                     locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![new_attempts, id],
                )?;
            } else {
                let delay_ms = backoff_base_ms.saturating_mul(1 << (new_attempts - 1) as u32);
                let available_at = (chrono::Utc::now()
                    + chrono::Duration::milliseconds(delay_ms as i64))
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string();
                conn.execute(
                    "UPDATE queue SET status = 'pending', attempts = ?1,
                     locked_until = NULL, available_at = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![new_attempts, available_at, id],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Requeue entries whose worker died mid-processing.
///
/// A `processing` entry with an expired lock goes back to `pending` without
/// consuming an attempt. Returns the number of requeued entries.
pub async fn requeue_stalled(db: &Database, queue_name: &str) -> Result<usize, EkkleError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let requeued = conn.execute(
                "UPDATE queue SET status = 'pending', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE queue_name = ?1 AND status = 'processing'
                   AND locked_until IS NOT NULL
                   AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![queue_name],
            )?;
            Ok(requeued)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Purge completed entries past the retention window or count cap.
pub async fn purge_completed(
    db: &Database,
    queue_name: &str,
    max_age_hours: u64,
    keep_count: i64,
) -> Result<usize, EkkleError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let by_age = conn.execute(
                "DELETE FROM queue
                 WHERE queue_name = ?1 AND status = 'completed'
                   AND updated_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2)",
                params![queue_name, format!("-{max_age_hours} hours")],
            )?;
            // Keep at most `keep_count` completed entries regardless of age.
            let by_count = conn.execute(
                "DELETE FROM queue
                 WHERE queue_name = ?1 AND status = 'completed'
                   AND id NOT IN (
                       SELECT id FROM queue
                       WHERE queue_name = ?1 AND status = 'completed'
                       ORDER BY id DESC LIMIT ?2
                   )",
                params![queue_name, keep_count],
            )?;
            Ok(by_age + by_count)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Purge failed entries past the retention window.
pub async fn purge_failed(
    db: &Database,
    queue_name: &str,
    max_age_hours: u64,
) -> Result<usize, EkkleError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let purged = conn.execute(
                "DELETE FROM queue
                 WHERE queue_name = ?1 AND status = 'failed'
                   AND updated_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2)",
                params![queue_name, format!("-{max_age_hours} hours")],
            )?;
            Ok(purged)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Queue depth counters (waiting/active/completed/failed/delayed).
pub async fn stats(db: &Database, queue_name: &str) -> Result<QueueStats, EkkleError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stats = QueueStats::default();
            let mut stmt = conn.prepare(
                "SELECT status,
                        SUM(CASE WHEN status = 'pending'
                                  AND available_at > strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                                 THEN 1 ELSE 0 END),
                        COUNT(*)
                 FROM queue WHERE queue_name = ?1 GROUP BY status",
            )?;
            let rows = stmt.query_map(params![queue_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            for row in rows {
                let (status, delayed, total) = row?;
                match status.as_str() {
                    "pending" => {
                        stats.delayed = delayed;
                        stats.waiting = total - delayed;
                    }
                    "processing" => stats.active = total,
                    "completed" => stats.completed = total,
                    "failed" => stats.failed = total,
                    _ => {}
                }
            }
            Ok(stats)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}
