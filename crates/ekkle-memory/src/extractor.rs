// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort structured fact extraction from inbound messages.
//!
//! The extractor asks the completion API for a small JSON object with the
//! facts we care about (address, instagram, congregation size, city, state).
//! Output that does not parse into that shape is discarded -- extraction is
//! never allowed to fail the pipeline.

use ekkle_config::model::MemoryConfig;
use ekkle_core::CompletionAdapter;
use ekkle_core::types::{ChatMessage, CompletionRequest, Metadata};
use serde::Deserialize;
use tracing::{debug, warn};

const EXTRACTION_INSTRUCTION: &str = "Analyze the customer's message and extract relevant facts.\n\
Return ONLY a JSON object with any of these fields that are present:\n\
- address: full street address if mentioned\n\
- instagram: the @handle if mentioned\n\
- congregation_size: number of members if mentioned\n\
- city: city if mentioned\n\
- state: state if mentioned\n\
\n\
Omit fields that are not present. Respond ONLY with the JSON, no explanation.";

/// Typed shape of the extractor's output; anything else is discarded.
#[derive(Debug, Default, Deserialize)]
struct ExtractedFacts {
    address: Option<String>,
    instagram: Option<String>,
    congregation_size: Option<serde_json::Value>,
    city: Option<String>,
    state: Option<String>,
}

impl ExtractedFacts {
    fn into_metadata(self) -> Metadata {
        let mut metadata = Metadata::new();
        if let Some(address) = self.address {
            metadata.insert("address".into(), address.into());
        }
        if let Some(instagram) = self.instagram {
            metadata.insert("instagram".into(), instagram.into());
        }
        if let Some(size) = self.congregation_size {
            metadata.insert("congregation_size".into(), size);
        }
        if let Some(city) = self.city {
            metadata.insert("city".into(), city.into());
        }
        if let Some(state) = self.state {
            metadata.insert("state".into(), state.into());
        }
        metadata
    }
}

/// Extract structured facts from a message. Empty on any failure.
pub async fn extract_lead_facts(
    completion: &dyn CompletionAdapter,
    message: &str,
    config: &MemoryConfig,
) -> Metadata {
    let request = CompletionRequest {
        messages: vec![
            ChatMessage::system(EXTRACTION_INSTRUCTION),
            ChatMessage::user(message),
        ],
        temperature: config.extraction_temperature,
        max_tokens: config.extraction_max_tokens,
    };

    let result = match completion.complete(request).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "fact extraction call failed");
            return Metadata::new();
        }
    };

    match serde_json::from_str::<ExtractedFacts>(result.content.trim()) {
        Ok(facts) => {
            let metadata = facts.into_metadata();
            if !metadata.is_empty() {
                debug!(fields = ?metadata.keys().collect::<Vec<_>>(), "extracted lead facts");
            }
            metadata
        }
        Err(_) => {
            debug!("extractor output not parseable, discarding");
            Metadata::new()
        }
    }
}

/// Merge extracted facts into existing metadata.
///
/// Extractor output wins per extracted field; all other existing keys are
/// preserved.
pub fn merge_metadata(current: &Metadata, extracted: &Metadata) -> Metadata {
    let mut merged = current.clone();
    for (key, value) in extracted {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
