// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic region scoring.
//!
//! Derives a competitor estimate from address keywords (population-density
//! proxy) and a digital-presence score from the instagram handle. The
//! heuristic is a stand-in for real place/social APIs; the shape of the
//! result is the contract that matters.

use ekkle_core::Opportunity;
use rand::Rng;

/// Deterministic-shaped result of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub competitor_count: i64,
    pub digital_score: i64,
    pub opportunity: Opportunity,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Neutral default returned whenever analysis cannot run.
pub fn neutral_fallback() -> AnalysisResult {
    AnalysisResult {
        competitor_count: 5,
        digital_score: 3,
        opportunity: Opportunity::Medium,
        insights: vec!["Analysis still in progress".to_string()],
        recommendations: vec!["Awaiting more information".to_string()],
    }
}

/// Score a region from address and instagram signals.
pub fn score_region(
    address: Option<&str>,
    instagram: Option<&str>,
    rng: &mut impl Rng,
) -> AnalysisResult {
    let mut competitor_count: i64 = 5;
    let mut opportunity = Opportunity::Medium;

    if let Some(address) = address {
        let address_lower = address.to_lowercase();
        if address_lower.contains("são paulo") || address_lower.contains("rio de janeiro") {
            // Dense metro areas: crowded and high-upside.
            competitor_count = rng.gen_range(8..=17);
            opportunity = Opportunity::High;
        } else if address_lower.contains("belo horizonte") || address_lower.contains("salvador") {
            competitor_count = rng.gen_range(5..=10);
            opportunity = Opportunity::High;
        } else if address_lower.contains("interior") || address_lower.contains("zona rural") {
            competitor_count = rng.gen_range(1..=3);
        } else {
            competitor_count = rng.gen_range(3..=7);
        }
    }

    let digital_score: i64 = if instagram.is_some() {
        rng.gen_range(4..=7)
    } else {
        rng.gen_range(1..=3)
    };

    let mut insights = Vec::new();
    let mut recommendations = Vec::new();

    if competitor_count > 7 {
        insights.push(format!(
            "High church density in the region ({competitor_count} identified)"
        ));
        insights.push("Competitive market requires digital differentiation".to_string());
    } else if competitor_count < 4 {
        insights.push(format!(
            "Low competition in the region (only {competitor_count} churches identified)"
        ));
        insights.push("Opportunity to become the digital reference in the region".to_string());
    } else {
        insights.push(format!(
            "Moderate competition in the region ({competitor_count} churches)"
        ));
    }

    if digital_score < 4 {
        insights.push("Current digital presence is limited".to_string());
        recommendations.push("Create professional social media profiles".to_string());
        recommendations.push("Develop a digital content strategy".to_string());
    } else if digital_score >= 7 {
        insights.push("Solid digital presence already established".to_string());
        recommendations.push("Boost engagement with management tooling".to_string());
    } else {
        insights.push("Digital presence under development".to_string());
        recommendations.push("Strengthen member communication through the app".to_string());
    }

    recommendations.push("Implement an integrated management system".to_string());
    recommendations.push("Automate member communication".to_string());
    if opportunity == Opportunity::High {
        recommendations.push("Seize the moment for digital expansion".to_string());
    }

    AnalysisResult {
        competitor_count,
        digital_score,
        opportunity,
        insights,
        recommendations,
    }
}
