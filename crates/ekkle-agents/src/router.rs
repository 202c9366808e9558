// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent routing table and status/temperature transition rules.
//!
//! Routing derives the handling persona from lead status, falling back to
//! temperature when the status does not map cleanly. Transitions are
//! evaluated in priority order; the first matching rule wins.

use ekkle_core::{AgentStage, Intent, LeadStatus, Temperature};

/// Select the persona for a lead's current state.
///
/// sdr handles {new, contacted}; bdr handles {qualified}; closer handles
/// {negotiating, won}. Remaining states route by temperature.
pub fn route(status: LeadStatus, temperature: Temperature) -> AgentStage {
    match status {
        LeadStatus::New | LeadStatus::Contacted => AgentStage::Sdr,
        LeadStatus::Qualified => AgentStage::Bdr,
        LeadStatus::Negotiating | LeadStatus::Won => AgentStage::Closer,
        LeadStatus::Lost => match temperature {
            Temperature::Hot => AgentStage::Closer,
            Temperature::Warm => AgentStage::Bdr,
            Temperature::Cold => AgentStage::Sdr,
        },
    }
}

/// Status/temperature change decided after a processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: LeadStatus,
    pub temperature: Temperature,
}

/// Evaluate the transition rules in priority order; first match wins.
///
/// 1. closing -> negotiating/hot
/// 2. pricing, not already qualified/negotiating -> qualified/warm
/// 3. technical while new/contacted -> qualified/warm
/// 4. sdr handling a new lead -> contacted/warm
pub fn apply_transitions(
    status: LeadStatus,
    agent: AgentStage,
    intent: Intent,
) -> Option<Transition> {
    if intent == Intent::Closing {
        return Some(Transition {
            status: LeadStatus::Negotiating,
            temperature: Temperature::Hot,
        });
    }

    if intent == Intent::Pricing
        && !matches!(status, LeadStatus::Qualified | LeadStatus::Negotiating)
    {
        return Some(Transition {
            status: LeadStatus::Qualified,
            temperature: Temperature::Warm,
        });
    }

    if intent == Intent::Technical
        && matches!(status, LeadStatus::New | LeadStatus::Contacted)
    {
        return Some(Transition {
            status: LeadStatus::Qualified,
            temperature: Temperature::Warm,
        });
    }

    if agent == AgentStage::Sdr && status == LeadStatus::New {
        return Some(Transition {
            status: LeadStatus::Contacted,
            temperature: Temperature::Warm,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_routes_directly() {
        for temperature in [Temperature::Cold, Temperature::Warm, Temperature::Hot] {
            assert_eq!(route(LeadStatus::New, temperature), AgentStage::Sdr);
            assert_eq!(route(LeadStatus::Contacted, temperature), AgentStage::Sdr);
            assert_eq!(route(LeadStatus::Qualified, temperature), AgentStage::Bdr);
            assert_eq!(route(LeadStatus::Negotiating, temperature), AgentStage::Closer);
            assert_eq!(route(LeadStatus::Won, temperature), AgentStage::Closer);
        }
    }

    #[test]
    fn unmapped_status_falls_back_to_temperature() {
        assert_eq!(route(LeadStatus::Lost, Temperature::Hot), AgentStage::Closer);
        assert_eq!(route(LeadStatus::Lost, Temperature::Warm), AgentStage::Bdr);
        assert_eq!(route(LeadStatus::Lost, Temperature::Cold), AgentStage::Sdr);
    }

    #[test]
    fn closing_always_moves_to_negotiating_hot() {
        for status in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::Negotiating,
        ] {
            let transition = apply_transitions(status, AgentStage::Sdr, Intent::Closing).unwrap();
            assert_eq!(transition.status, LeadStatus::Negotiating);
            assert_eq!(transition.temperature, Temperature::Hot);
        }
    }

    #[test]
    fn pricing_qualifies_unless_already_past() {
        let transition =
            apply_transitions(LeadStatus::New, AgentStage::Sdr, Intent::Pricing).unwrap();
        assert_eq!(transition.status, LeadStatus::Qualified);
        assert_eq!(transition.temperature, Temperature::Warm);

        assert!(
            apply_transitions(LeadStatus::Qualified, AgentStage::Bdr, Intent::Pricing).is_none()
        );
        assert!(
            apply_transitions(LeadStatus::Negotiating, AgentStage::Closer, Intent::Pricing)
                .is_none()
        );
    }

    #[test]
    fn technical_qualifies_early_leads_only() {
        let transition =
            apply_transitions(LeadStatus::Contacted, AgentStage::Sdr, Intent::Technical).unwrap();
        assert_eq!(transition.status, LeadStatus::Qualified);

        assert!(
            apply_transitions(LeadStatus::Qualified, AgentStage::Bdr, Intent::Technical).is_none()
        );
    }

    #[test]
    fn sdr_first_touch_marks_contacted() {
        let transition =
            apply_transitions(LeadStatus::New, AgentStage::Sdr, Intent::Greeting).unwrap();
        assert_eq!(transition.status, LeadStatus::Contacted);
        assert_eq!(transition.temperature, Temperature::Warm);

        // Not new anymore: nothing fires for a plain greeting.
        assert!(
            apply_transitions(LeadStatus::Contacted, AgentStage::Sdr, Intent::Greeting).is_none()
        );
    }

    #[test]
    fn priority_order_pricing_beats_first_touch() {
        // new + sdr + pricing matches rule 2 before rule 4.
        let transition =
            apply_transitions(LeadStatus::New, AgentStage::Sdr, Intent::Pricing).unwrap();
        assert_eq!(transition.status, LeadStatus::Qualified);
        assert_eq!(transition.temperature, Temperature::Warm);
    }

    #[test]
    fn unknown_intent_changes_nothing_for_settled_leads() {
        assert!(
            apply_transitions(LeadStatus::Qualified, AgentStage::Bdr, Intent::Unknown).is_none()
        );
        assert!(apply_transitions(LeadStatus::Won, AgentStage::Closer, Intent::Greeting).is_none());
    }
}
