// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead CRUD operations.
//!
//! Leads are unique per phone number. Creation is an idempotent
//! get-or-create: a concurrent insert for the same phone resolves to the
//! existing row instead of erroring.

use ekkle_core::EkkleError;
use ekkle_core::types::{AgentStage, LeadStatus, Temperature};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{Lead, Metadata};
use crate::queries::{now_ts, parse_enum, parse_json};

/// Partial update applied to a lead; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub church_name: Option<String>,
    pub status: Option<LeadStatus>,
    pub temperature: Option<Temperature>,
    pub assigned_agent: Option<AgentStage>,
    pub metadata: Option<Metadata>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.church_name.is_none()
            && self.status.is_none()
            && self.temperature.is_none()
            && self.assigned_agent.is_none()
            && self.metadata.is_none()
    }
}

fn lead_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    let status: String = row.get(4)?;
    let temperature: String = row.get(5)?;
    let assigned_agent: String = row.get(6)?;
    let metadata: String = row.get(7)?;
    Ok(Lead {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        church_name: row.get(3)?,
        status: parse_enum(4, &status)?,
        temperature: parse_enum(5, &temperature)?,
        assigned_agent: parse_enum(6, &assigned_agent)?,
        metadata: parse_json(7, &metadata)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const LEAD_COLUMNS: &str = "id, phone, name, church_name, status, temperature, \
                            assigned_agent, metadata, created_at, updated_at";

/// Find a lead by phone number.
pub async fn get_by_phone(db: &Database, phone: &str) -> Result<Option<Lead>, EkkleError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LEAD_COLUMNS} FROM leads WHERE phone = ?1"
            ))?;
            match stmt.query_row(params![phone], lead_from_row) {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Find a lead by id.
pub async fn get_by_id(db: &Database, id: &str) -> Result<Option<Lead>, EkkleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"))?;
            match stmt.query_row(params![id], lead_from_row) {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Create a lead for `phone`, or return the existing one.
///
/// Returns `(lead, is_new)`. `INSERT OR IGNORE` on the unique phone column
/// makes the race between two workers for the same phone resolve to a single
/// row.
pub async fn create_or_get(
    db: &Database,
    phone: &str,
    name: Option<&str>,
) -> Result<(Lead, bool), EkkleError> {
    let phone = phone.to_string();
    let name = name.map(|n| n.to_string());
    db.connection()
        .call(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = now_ts();
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO leads
                     (id, phone, name, status, temperature, assigned_agent, metadata,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'new', 'cold', 'sdr', '{}', ?4, ?4)",
                params![id, phone, name, now],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {LEAD_COLUMNS} FROM leads WHERE phone = ?1"
            ))?;
            let lead = stmt.query_row(params![phone], lead_from_row)?;
            Ok((lead, inserted == 1))
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Apply a partial update to a lead.
pub async fn update(db: &Database, id: &str, patch: LeadPatch) -> Result<(), EkkleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let metadata = match &patch.metadata {
                Some(m) => Some(serde_json::to_string(m).map_err(|e| {
                    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
                })?),
                None => None,
            };
            conn.execute(
                "UPDATE leads SET
                     name = COALESCE(?2, name),
                     church_name = COALESCE(?3, church_name),
                     status = COALESCE(?4, status),
                     temperature = COALESCE(?5, temperature),
                     assigned_agent = COALESCE(?6, assigned_agent),
                     metadata = COALESCE(?7, metadata),
                     updated_at = ?8
                 WHERE id = ?1",
                params![
                    id,
                    patch.name,
                    patch.church_name,
                    patch.status.map(|s| s.to_string()),
                    patch.temperature.map(|t| t.to_string()),
                    patch.assigned_agent.map(|a| a.to_string()),
                    metadata,
                    now_ts(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

/// Count all leads (used by readiness diagnostics).
pub async fn count(db: &Database) -> Result<i64, EkkleError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("leads.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_or_get_creates_with_defaults() {
        let (db, _dir) = setup_db().await;

        let (lead, is_new) = create_or_get(&db, "5511999990001", Some("Pr. João"))
            .await
            .unwrap();
        assert!(is_new);
        assert_eq!(lead.phone, "5511999990001");
        assert_eq!(lead.name.as_deref(), Some("Pr. João"));
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.temperature, Temperature::Cold);
        assert_eq!(lead.assigned_agent, AgentStage::Sdr);
        assert!(lead.metadata.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn create_or_get_is_idempotent_per_phone() {
        let (db, _dir) = setup_db().await;

        let (first, is_new) = create_or_get(&db, "5511999990001", None).await.unwrap();
        assert!(is_new);
        let (second, is_new) = create_or_get(&db, "5511999990001", Some("later name"))
            .await
            .unwrap();
        assert!(!is_new);
        assert_eq!(first.id, second.id);
        // Name hint on the second call does not clobber the existing row.
        assert!(second.name.is_none());
        assert_eq!(count(&db).await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn patch_updates_only_provided_fields() {
        let (db, _dir) = setup_db().await;
        let (lead, _) = create_or_get(&db, "5511", None).await.unwrap();

        let mut metadata = Metadata::new();
        metadata.insert("address".into(), serde_json::json!("Rua A, 1"));
        update(
            &db,
            &lead.id,
            LeadPatch {
                status: Some(LeadStatus::Qualified),
                temperature: Some(Temperature::Warm),
                metadata: Some(metadata),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = get_by_id(&db, &lead.id).await.unwrap().unwrap();
        assert_eq!(updated.status, LeadStatus::Qualified);
        assert_eq!(updated.temperature, Temperature::Warm);
        assert_eq!(updated.assigned_agent, AgentStage::Sdr);
        assert_eq!(
            updated.metadata.get("address"),
            Some(&serde_json::json!("Rua A, 1"))
        );
        assert!(updated.name.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_by_phone_missing_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_by_phone(&db, "0000").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
