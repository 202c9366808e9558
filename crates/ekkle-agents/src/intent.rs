// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification over a fixed closed set.
//!
//! The classifier asks the completion API for exactly one category; any
//! response outside the set, and any API failure, coerces to `unknown`.

use std::str::FromStr;

use ekkle_core::types::{ChatMessage, CompletionRequest};
use ekkle_core::{CompletionAdapter, Intent};
use tracing::warn;

const CLASSIFIER_INSTRUCTION: &str = "You are an intent classifier. Analyze the user's message \
and return ONLY one of the following categories:\n\
- greeting: a salutation or pleasantry\n\
- pricing: a question about price or cost\n\
- features: a question about functionality\n\
- technical: a specific technical question\n\
- objection: resistance or an objection to buying\n\
- closing: intent to close the deal\n\
- support: a support request\n\
- off_hours: a message outside business hours\n\
- unknown: none of the above\n\
\n\
Respond ONLY with the category, no explanation.";

/// Classify an inbound message into the closed intent set.
pub async fn classify_intent(completion: &dyn CompletionAdapter, message: &str) -> Intent {
    let request = CompletionRequest {
        messages: vec![
            ChatMessage::system(CLASSIFIER_INSTRUCTION),
            ChatMessage::user(message),
        ],
        temperature: 0.1,
        max_tokens: 20,
    };

    let result = match completion.complete(request).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "intent classification failed, defaulting to unknown");
            return Intent::Unknown;
        }
    };

    let normalized = result.content.trim().to_lowercase();
    match Intent::from_str(&normalized) {
        Ok(intent) => intent,
        Err(_) => {
            warn!(detected = %normalized, "invalid intent detected, defaulting to unknown");
            Intent::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekkle_test_utils::MockCompletion;

    #[tokio::test]
    async fn valid_intents_pass_through() {
        let mock = MockCompletion::with_responses(vec!["pricing", "closing", "off_hours"]);
        assert_eq!(classify_intent(&mock, "quanto custa?").await, Intent::Pricing);
        assert_eq!(classify_intent(&mock, "quero fechar").await, Intent::Closing);
        assert_eq!(classify_intent(&mock, "boa noite").await, Intent::OffHours);
    }

    #[tokio::test]
    async fn output_is_trimmed_and_lowercased() {
        let mock = MockCompletion::with_responses(vec!["  Greeting \n"]);
        assert_eq!(classify_intent(&mock, "oi").await, Intent::Greeting);
    }

    #[tokio::test]
    async fn out_of_set_output_coerces_to_unknown() {
        let mock = MockCompletion::with_responses(vec!["curious-about-weather"]);
        assert_eq!(classify_intent(&mock, "vai chover?").await, Intent::Unknown);
    }

    #[tokio::test]
    async fn classifier_failure_coerces_to_unknown() {
        let mock = MockCompletion::new();
        mock.push_error("classifier outage").await;
        assert_eq!(classify_intent(&mock, "oi").await, Intent::Unknown);
    }
}
