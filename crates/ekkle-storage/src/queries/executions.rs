// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent execution audit records.
//!
//! One row per agent invocation attempt: created as `started`, finalized as
//! `completed` or `failed`. Used for auditing and metrics, never for control
//! flow.

use ekkle_core::EkkleError;
use ekkle_core::types::{AgentStage, ExecutionStatus, Intent};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::AgentExecution;
use crate::queries::{now_ts, parse_enum};

fn execution_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AgentExecution> {
    let agent_name: String = row.get(2)?;
    let intent: Option<String> = row.get(5)?;
    let status: String = row.get(8)?;
    Ok(AgentExecution {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        agent_name: parse_enum(2, &agent_name)?,
        input_message: row.get(3)?,
        output_message: row.get(4)?,
        intent_detected: intent.as_deref().map(|i| parse_enum(5, i)).transpose()?,
        tokens_used: row.get(6)?,
        execution_time_ms: row.get(7)?,
        status: parse_enum(8, &status)?,
        error_message: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const EXECUTION_COLUMNS: &str = "id, lead_id, agent_name, input_message, output_message, \
                                 intent_detected, tokens_used, execution_time_ms, status, \
                                 error_message, created_at";

/// Create a `started` execution record and return its id.
pub async fn start(
    db: &Database,
    lead_id: &str,
    agent_name: AgentStage,
    input_message: &str,
) -> Result<String, EkkleError> {
    let lead_id = lead_id.to_string();
    let input_message = input_message.to_string();
    db.connection()
        .call(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO agent_executions
                     (id, lead_id, agent_name, input_message, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'started', ?5)",
                params![id, lead_id, agent_name.to_string(), input_message, now_ts()],
            )?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Finalize an execution as completed.
pub async fn complete(
    db: &Database,
    id: &str,
    output_message: &str,
    intent: Intent,
    tokens_used: i64,
    execution_time_ms: i64,
) -> Result<(), EkkleError> {
    let id = id.to_string();
    let output_message = output_message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE agent_executions SET
                     output_message = ?2, intent_detected = ?3, tokens_used = ?4,
                     execution_time_ms = ?5, status = 'completed'
                 WHERE id = ?1",
                params![
                    id,
                    output_message,
                    intent.to_string(),
                    tokens_used,
                    execution_time_ms
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Finalize an execution as failed.
pub async fn fail(
    db: &Database,
    id: &str,
    error_message: &str,
    execution_time_ms: i64,
) -> Result<(), EkkleError> {
    let id = id.to_string();
    let error_message = error_message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE agent_executions SET
                     error_message = ?2, execution_time_ms = ?3, status = 'failed'
                 WHERE id = ?1",
                params![id, error_message, execution_time_ms],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Fetch an execution record by id.
pub async fn get(db: &Database, id: &str) -> Result<Option<AgentExecution>, EkkleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXECUTION_COLUMNS} FROM agent_executions WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], execution_from_row) {
                Ok(execution) => Ok(Some(execution)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Executions for a lead, newest first.
pub async fn for_lead(
    db: &Database,
    lead_id: &str,
    limit: i64,
) -> Result<Vec<AgentExecution>, EkkleError> {
    let lead_id = lead_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXECUTION_COLUMNS} FROM agent_executions
                 WHERE lead_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![lead_id, limit], execution_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::leads;
    use tempfile::tempdir;

    async fn setup_db_with_lead() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("executions.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let (lead, _) = leads::create_or_get(&db, "5511999990001", None)
            .await
            .unwrap();
        (db, lead.id, dir)
    }

    #[tokio::test]
    async fn start_then_complete_lifecycle() {
        let (db, lead_id, _dir) = setup_db_with_lead().await;

        let id = start(&db, &lead_id, AgentStage::Sdr, "Quero saber o preço")
            .await
            .unwrap();
        let started = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(started.status, ExecutionStatus::Started);
        assert!(started.output_message.is_none());

        complete(&db, &id, "Our plans start at...", Intent::Pricing, 120, 850)
            .await
            .unwrap();
        let done = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);
        assert_eq!(done.output_message.as_deref(), Some("Our plans start at..."));
        assert_eq!(done.intent_detected, Some(Intent::Pricing));
        assert_eq!(done.tokens_used, 120);
        assert_eq!(done.execution_time_ms, 850);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn start_then_fail_lifecycle() {
        let (db, lead_id, _dir) = setup_db_with_lead().await;

        let id = start(&db, &lead_id, AgentStage::Bdr, "hello")
            .await
            .unwrap();
        fail(&db, &id, "completion error: upstream 503", 412)
            .await
            .unwrap();

        let failed = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(failed.status, ExecutionStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("completion error: upstream 503")
        );
        assert!(failed.output_message.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn for_lead_returns_newest_first() {
        let (db, lead_id, _dir) = setup_db_with_lead().await;

        let first = start(&db, &lead_id, AgentStage::Sdr, "one").await.unwrap();
        let second = start(&db, &lead_id, AgentStage::Sdr, "two").await.unwrap();

        let all = for_lead(&db, &lead_id, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);

        db.close().await.unwrap();
    }
}
