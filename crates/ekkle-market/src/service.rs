// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Market analysis service with freshness caching.
//!
//! Contract: reuse a stored analysis younger than the freshness window,
//! regenerate otherwise, and fall back to a neutral default on any error.
//! An analysis fires only when address or instagram is collected for the
//! first time.

use std::sync::Arc;

use chrono::DateTime;
use ekkle_config::model::MarketConfig;
use ekkle_core::types::{Lead, MarketAnalysisRecord, Metadata};
use ekkle_core::{Clock, EkkleError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::{info, warn};

use ekkle_storage::Database;
use ekkle_storage::queries::analyses;

use crate::scoring::{self, AnalysisResult};

/// Analysis type discriminator stored with each record.
pub const ANALYSIS_TYPE: &str = "market_analysis";

/// Derives and caches competitor/opportunity scores per lead.
pub struct MarketAnalysisService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    config: MarketConfig,
    rng: Mutex<StdRng>,
}

impl MarketAnalysisService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, config: MarketConfig) -> Self {
        Self::with_rng(db, clock, config, StdRng::from_entropy())
    }

    /// Deterministic scoring for tests.
    pub fn seeded(db: Arc<Database>, clock: Arc<dyn Clock>, config: MarketConfig, seed: u64) -> Self {
        Self::with_rng(db, clock, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(db: Arc<Database>, clock: Arc<dyn Clock>, config: MarketConfig, rng: StdRng) -> Self {
        Self {
            db,
            clock,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Fire an analysis only when address or instagram appears in newly
    /// extracted data AND was absent from the lead's prior metadata.
    pub fn should_trigger(prior_metadata: &Metadata, extracted: &Metadata) -> bool {
        let is_set = |metadata: &Metadata, key: &str| {
            metadata
                .get(key)
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""))
        };
        let new_address = is_set(extracted, "address") && !is_set(prior_metadata, "address");
        let new_instagram = is_set(extracted, "instagram") && !is_set(prior_metadata, "instagram");
        new_address || new_instagram
    }

    /// Analyze the lead's region, reusing a fresh stored analysis.
    ///
    /// Never fails: any storage error degrades to the neutral default.
    pub async fn analyze(
        &self,
        lead: &Lead,
        address: Option<&str>,
        instagram: Option<&str>,
    ) -> AnalysisResult {
        match self.try_analyze(lead, address, instagram).await {
            Ok(result) => result,
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "market analysis failed, using neutral default");
                scoring::neutral_fallback()
            }
        }
    }

    async fn try_analyze(
        &self,
        lead: &Lead,
        address: Option<&str>,
        instagram: Option<&str>,
    ) -> Result<AnalysisResult, EkkleError> {
        if let Some(existing) = analyses::latest(&self.db, &lead.id, ANALYSIS_TYPE).await? {
            if self.is_fresh(&existing) {
                info!(lead_id = %lead.id, analysis_id = %existing.id, "reusing cached market analysis");
                return Ok(result_from_record(&existing));
            }
        }

        let result = {
            let mut rng = self.rng.lock().await;
            scoring::score_region(address, instagram, &mut *rng)
        };

        let raw_data = serde_json::json!({
            "insights": result.insights,
            "recommendations": result.recommendations,
        });
        analyses::insert(
            &self.db,
            &lead.id,
            ANALYSIS_TYPE,
            address,
            instagram,
            result.competitor_count,
            result.digital_score,
            result.opportunity,
            &raw_data,
        )
        .await?;

        info!(
            lead_id = %lead.id,
            competitor_count = result.competitor_count,
            digital_score = result.digital_score,
            opportunity = %result.opportunity,
            "market analysis completed"
        );
        Ok(result)
    }

    fn is_fresh(&self, record: &MarketAnalysisRecord) -> bool {
        let Ok(created_at) = DateTime::parse_from_rfc3339(&record.created_at) else {
            return false;
        };
        let age = self.clock.now_utc().signed_duration_since(created_at);
        age < chrono::Duration::hours(self.config.freshness_hours)
    }
}

fn result_from_record(record: &MarketAnalysisRecord) -> AnalysisResult {
    let strings = |key: &str| -> Vec<String> {
        record
            .raw_data
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    };
    AnalysisResult {
        competitor_count: record.competitor_count,
        digital_score: record.digital_score,
        opportunity: record.opportunity,
        insights: strings("insights"),
        recommendations: strings("recommendations"),
    }
}

/// Render the analysis into the block injected into the BDR prompt.
pub fn format_for_prompt(analysis: &AnalysisResult) -> String {
    format!(
        "=== REGIONAL MARKET ANALYSIS ===\n\
         Competitors in the region: {}\n\
         Digital score: {}/10\n\
         Opportunity: {}",
        analysis.competitor_count, analysis.digital_score, analysis.opportunity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekkle_core::Opportunity;
    use ekkle_test_utils::{FixedClock, open_temp_db, seed_lead};

    fn metadata_with(pairs: &[(&str, &str)]) -> Metadata {
        let mut metadata = Metadata::new();
        for (key, value) in pairs {
            metadata.insert((*key).into(), serde_json::json!(value));
        }
        metadata
    }

    #[test]
    fn triggers_only_on_first_collection() {
        let empty = Metadata::new();
        let with_address = metadata_with(&[("address", "Rua A, 1")]);
        let with_instagram = metadata_with(&[("instagram", "@igreja")]);

        assert!(MarketAnalysisService::should_trigger(&empty, &with_address));
        assert!(MarketAnalysisService::should_trigger(&empty, &with_instagram));
        // Already known: no trigger.
        assert!(!MarketAnalysisService::should_trigger(
            &with_address,
            &with_address
        ));
        // Nothing geographic/social extracted: no trigger.
        assert!(!MarketAnalysisService::should_trigger(
            &empty,
            &metadata_with(&[("city", "Campinas")])
        ));
        // Instagram new even though address known.
        assert!(MarketAnalysisService::should_trigger(
            &with_address,
            &with_instagram
        ));
    }

    #[tokio::test]
    async fn analysis_is_stored_and_reused_within_freshness_window() {
        let (db, _dir) = open_temp_db().await;
        let lead = seed_lead(&db, "5511999990001").await;
        let clock = Arc::new(FixedClock::at(chrono::Utc::now()));
        let service = MarketAnalysisService::seeded(
            db.clone(),
            clock.clone(),
            MarketConfig::default(),
            7,
        );

        let first = service
            .analyze(&lead, Some("Av. Paulista 1000, São Paulo"), Some("@igreja"))
            .await;
        assert_eq!(first.opportunity, Opportunity::High);

        // 23 hours later: reuse verbatim.
        clock.set(chrono::Utc::now() + chrono::Duration::hours(23));
        let reused = service.analyze(&lead, Some("different address"), None).await;
        assert_eq!(reused.competitor_count, first.competitor_count);
        assert_eq!(reused.digital_score, first.digital_score);
        assert_eq!(reused.insights, first.insights);

        let stored = analyses::latest(&db, &lead.id, ANALYSIS_TYPE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.competitor_count, first.competitor_count);
    }

    #[tokio::test]
    async fn stale_analysis_is_regenerated() {
        let (db, _dir) = open_temp_db().await;
        let lead = seed_lead(&db, "5511999990001").await;
        let clock = Arc::new(FixedClock::at(chrono::Utc::now()));
        let service = MarketAnalysisService::seeded(
            db.clone(),
            clock.clone(),
            MarketConfig::default(),
            7,
        );

        let _first = service.analyze(&lead, Some("Rua A, interior"), None).await;

        // 25 hours later: the cached record is stale, a new row is written.
        clock.set(chrono::Utc::now() + chrono::Duration::hours(25));
        let second = service
            .analyze(&lead, Some("Av. Paulista, São Paulo"), Some("@igreja"))
            .await;
        assert_eq!(second.opportunity, Opportunity::High);

        let stored = analyses::latest(&db, &lead.id, ANALYSIS_TYPE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.instagram.as_deref(), Some("@igreja"));
    }

    #[test]
    fn prompt_block_shape() {
        let block = format_for_prompt(&scoring::neutral_fallback());
        assert!(block.contains("REGIONAL MARKET ANALYSIS"));
        assert!(block.contains("Competitors in the region: 5"));
        assert!(block.contains("Digital score: 3/10"));
        assert!(block.contains("Opportunity: medium"));
    }
}
