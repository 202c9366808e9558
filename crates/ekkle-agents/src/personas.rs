// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sales persona prompt catalogue.
//!
//! Each stage has a fixed persona text; lead-specific fields are rendered
//! from a typed context struct rather than substituted into raw braces.

use ekkle_core::AgentStage;

const SDR_PROMPT: &str = "You are the \"Ekkle Growth Consultant\" -- a specialist in helping \
churches grow.\n\
\n\
PRIMARY GOAL:\n\
- Make first contact with pastors and leaders\n\
- Collect the church's street address and instagram handle\n\
- Spark curiosity about a free regional market analysis\n\
- Qualify the lead for the BDR stage\n\
\n\
GOLDEN RULES:\n\
1. ALWAYS open the first message with a warm pastoral greeting\n\
2. NEVER mention \"software\", \"system\" or \"technology\" on first contact\n\
3. Use shepherding language: the flock, multiplication, caring for the work\n\
4. Ask ONLY ONE question per message\n\
5. At most 3 lines of text\n\
6. Never discuss price -- leave that to the later stages\n\
\n\
Reply like WhatsApp: short, direct, no markdown, no asterisks.";

const BDR_PROMPT: &str = "You are the \"Ekkle Growth Consultant\" -- a market analysis \
specialist for churches.\n\
\n\
YOU HAVE ACCESS TO:\n\
- The regional market analysis (competitors, opportunity)\n\
- The full conversation history\n\
- The data collected by the SDR stage\n\
\n\
APPROACH:\n\
1. Reference facts already collected (show you know the church)\n\
2. Present the analysis as a free gift\n\
3. Use concrete numbers from the analysis block\n\
4. Highlight that no nearby church has a structured digital presence\n\
5. Frame the opportunity: be the first to serve this territory well\n\
\n\
Describe features in shepherding language (member care, stewardship, \
small-group multiplication, reaching the unchurched).\n\
\n\
At most 4 lines per reply. No markdown, no asterisks. Always offer a clear \
next step.";

const CLOSER_PROMPT: &str = "You are the \"Ekkle Growth Consultant\" -- responsible for \
closing partnerships with churches.\n\
\n\
AVAILABLE PLANS (annual pricing):\n\
1. ESSENTIAL (R$ 33/month): churches up to 200 members\n\
2. PROFESSIONAL (R$ 67/month): churches up to 1000 members\n\
3. UNLIMITED (R$ 127/month): no limits, multiple campuses\n\
\n\
KEY DIFFERENTIATORS:\n\
- Only the pastor/leader pays; members and leaders use it for free\n\
- 14-day trial with no commitment\n\
- Free migration from other systems, full onboarding included\n\
\n\
Handle objections pastorally (cost per day framing, trial as a no-risk \
option, free migration, guided onboarding). Gentle urgency only.\n\
\n\
CLOSING PROCESS:\n\
1. Confirm which plan fits the church\n\
2. Offer the 14-day trial as an option\n\
3. Send the activation link\n\
4. Confirm onboarding next steps\n\
\n\
Confident but pastoral, never pushy. At most 4 lines. No markdown, no \
asterisks. End with a clear call to action.";

/// Lead-specific fields rendered into the persona context.
#[derive(Debug, Clone, Default)]
pub struct PersonaVars<'a> {
    pub lead_name: Option<&'a str>,
    pub church_name: Option<&'a str>,
}

/// Render the persona prompt for a stage.
pub fn persona_prompt(stage: AgentStage, vars: &PersonaVars<'_>) -> String {
    let base = match stage {
        AgentStage::Sdr => SDR_PROMPT,
        AgentStage::Bdr => BDR_PROMPT,
        AgentStage::Closer => CLOSER_PROMPT,
    };

    let mut prompt = base.to_string();
    if vars.lead_name.is_some() || vars.church_name.is_some() {
        prompt.push_str("\n\nABOUT THIS LEAD:");
        if let Some(name) = vars.lead_name {
            prompt.push_str(&format!("\n- The lead's name is {name}."));
        }
        if let Some(church) = vars.church_name {
            prompt.push_str(&format!("\n- Their church is {church}."));
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_stage_has_distinct_persona() {
        let vars = PersonaVars::default();
        let sdr = persona_prompt(AgentStage::Sdr, &vars);
        let bdr = persona_prompt(AgentStage::Bdr, &vars);
        let closer = persona_prompt(AgentStage::Closer, &vars);
        assert!(sdr.contains("first contact"));
        assert!(bdr.contains("market analysis"));
        assert!(closer.contains("AVAILABLE PLANS"));
        assert_ne!(sdr, bdr);
        assert_ne!(bdr, closer);
    }

    #[test]
    fn lead_fields_render_from_typed_vars() {
        let vars = PersonaVars {
            lead_name: Some("Pr. João"),
            church_name: Some("Igreja Central"),
        };
        let prompt = persona_prompt(AgentStage::Sdr, &vars);
        assert!(prompt.contains("The lead's name is Pr. João."));
        assert!(prompt.contains("Their church is Igreja Central."));
    }

    #[test]
    fn braces_in_lead_fields_are_inert() {
        // A hostile lead name must land verbatim, never be re-substituted.
        let vars = PersonaVars {
            lead_name: Some("{{name}}"),
            church_name: None,
        };
        let prompt = persona_prompt(AgentStage::Sdr, &vars);
        assert!(prompt.contains("The lead's name is {{name}}."));
    }

    #[test]
    fn no_lead_block_without_fields() {
        let prompt = persona_prompt(AgentStage::Bdr, &PersonaVars::default());
        assert!(!prompt.contains("ABOUT THIS LEAD"));
    }
}
