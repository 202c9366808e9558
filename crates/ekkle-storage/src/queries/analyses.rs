// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Market analysis records.
//!
//! Zero or more rows per lead per analysis type; the newest row is the
//! active one, reused while it is inside the freshness window.

use ekkle_core::EkkleError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::MarketAnalysisRecord;
use crate::queries::{now_ts, parse_enum, parse_json};

fn analysis_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MarketAnalysisRecord> {
    let opportunity: String = row.get(7)?;
    let raw_data: String = row.get(8)?;
    Ok(MarketAnalysisRecord {
        id: row.get(0)?,
        lead_id: row.get(1)?,
        analysis_type: row.get(2)?,
        address: row.get(3)?,
        instagram: row.get(4)?,
        competitor_count: row.get(5)?,
        digital_score: row.get(6)?,
        opportunity: parse_enum(7, &opportunity)?,
        raw_data: parse_json(8, &raw_data)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const ANALYSIS_COLUMNS: &str = "id, lead_id, analysis_type, address, instagram, \
                                competitor_count, digital_score, opportunity, raw_data, \
                                created_at, updated_at";

/// Latest analysis of the given type for a lead, if any.
pub async fn latest(
    db: &Database,
    lead_id: &str,
    analysis_type: &str,
) -> Result<Option<MarketAnalysisRecord>, EkkleError> {
    let lead_id = lead_id.to_string();
    let analysis_type = analysis_type.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ANALYSIS_COLUMNS} FROM market_analyses
                 WHERE lead_id = ?1 AND analysis_type = ?2
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1"
            ))?;
            match stmt.query_row(params![lead_id, analysis_type], analysis_from_row) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Store a new analysis and return its id.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    db: &Database,
    lead_id: &str,
    analysis_type: &str,
    address: Option<&str>,
    instagram: Option<&str>,
    competitor_count: i64,
    digital_score: i64,
    opportunity: ekkle_core::Opportunity,
    raw_data: &serde_json::Value,
) -> Result<String, EkkleError> {
    let lead_id = lead_id.to_string();
    let analysis_type = analysis_type.to_string();
    let address = address.map(|s| s.to_string());
    let instagram = instagram.map(|s| s.to_string());
    let raw_data = raw_data.clone();
    db.connection()
        .call(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let raw_json = serde_json::to_string(&raw_data)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            let now = now_ts();
            conn.execute(
                "INSERT INTO market_analyses
                     (id, lead_id, analysis_type, address, instagram, competitor_count,
                      digital_score, opportunity, raw_data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    id,
                    lead_id,
                    analysis_type,
                    address,
                    instagram,
                    competitor_count,
                    digital_score,
                    opportunity.to_string(),
                    raw_json,
                    now,
                ],
            )?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err::<rusqlite::Error>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::leads;
    use ekkle_core::Opportunity;
    use tempfile::tempdir;

    async fn setup_db_with_lead() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("analyses.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let (lead, _) = leads::create_or_get(&db, "5511999990001", None)
            .await
            .unwrap();
        (db, lead.id, dir)
    }

    #[tokio::test]
    async fn insert_and_fetch_latest() {
        let (db, lead_id, _dir) = setup_db_with_lead().await;

        assert!(
            latest(&db, &lead_id, "market_analysis")
                .await
                .unwrap()
                .is_none()
        );

        let raw = serde_json::json!({
            "insights": ["low competition nearby"],
            "recommendations": ["build a digital presence"],
        });
        insert(
            &db,
            &lead_id,
            "market_analysis",
            Some("Rua A, 1 - Interior"),
            None,
            3,
            2,
            Opportunity::Medium,
            &raw,
        )
        .await
        .unwrap();

        let record = latest(&db, &lead_id, "market_analysis")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.competitor_count, 3);
        assert_eq!(record.digital_score, 2);
        assert_eq!(record.opportunity, Opportunity::Medium);
        assert_eq!(record.address.as_deref(), Some("Rua A, 1 - Interior"));
        assert_eq!(record.raw_data["insights"][0], "low competition nearby");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_prefers_newest_record() {
        let (db, lead_id, _dir) = setup_db_with_lead().await;
        let raw = serde_json::json!({});

        insert(
            &db,
            &lead_id,
            "market_analysis",
            None,
            None,
            2,
            1,
            Opportunity::Low,
            &raw,
        )
        .await
        .unwrap();
        let newest = insert(
            &db,
            &lead_id,
            "market_analysis",
            None,
            Some("@igreja"),
            9,
            7,
            Opportunity::High,
            &raw,
        )
        .await
        .unwrap();

        let record = latest(&db, &lead_id, "market_analysis")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, newest);
        assert_eq!(record.opportunity, Opportunity::High);

        db.close().await.unwrap();
    }
}
