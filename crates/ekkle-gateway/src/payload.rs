// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payload decoding.
//!
//! Provider payloads decode into either a validated structured envelope or
//! an explicit `Unrecognized` variant -- never silently duck-typed.

use serde::Deserialize;

/// Full provider envelope for a message event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub instance: String,
    pub data: MessageData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    pub key: MessageKey,
    pub message: MessageContent,
    #[serde(rename = "messageTimestamp")]
    pub message_timestamp: i64,
    #[serde(rename = "pushName", default)]
    pub push_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageKey {
    #[serde(rename = "remoteJid")]
    pub remote_jid: String,
    #[serde(rename = "fromMe")]
    pub from_me: bool,
    pub id: String,
}

/// Known message-content shapes, in text-extraction preference order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub conversation: Option<String>,
    #[serde(rename = "extendedTextMessage", default)]
    pub extended_text_message: Option<ExtendedTextMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedTextMessage {
    pub text: String,
}

impl MessageContent {
    /// Plain text from the first populated content shape.
    pub fn text(&self) -> Option<&str> {
        if let Some(conversation) = &self.conversation {
            return Some(conversation);
        }
        if let Some(extended) = &self.extended_text_message {
            return Some(&extended.text);
        }
        // Media and other message types are not processed.
        None
    }
}

/// Decoded webhook body.
#[derive(Debug)]
pub enum WebhookEvent {
    Message(Box<WebhookEnvelope>),
    Unrecognized,
}

/// Decode a raw webhook body into a tagged event.
pub fn decode_webhook(body: &serde_json::Value) -> WebhookEvent {
    match serde_json::from_value::<WebhookEnvelope>(body.clone()) {
        Ok(envelope) => WebhookEvent::Message(Box::new(envelope)),
        Err(_) => WebhookEvent::Unrecognized,
    }
}

/// Extract the bare phone number from a remote JID.
///
/// `5511999999999@s.whatsapp.net` -> `5511999999999`
pub fn extract_phone(remote_jid: &str) -> String {
    remote_jid
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_body(message: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "event": "messages.upsert",
            "instance": "ekkle-sales",
            "data": {
                "key": {
                    "remoteJid": "5511999990001@s.whatsapp.net",
                    "fromMe": false,
                    "id": "abc-1"
                },
                "message": message,
                "messageTimestamp": 1700000000,
                "pushName": "Pr. João"
            }
        })
    }

    #[test]
    fn decodes_conversation_payload() {
        let body = message_body(serde_json::json!({"conversation": "Quero saber o preço"}));
        let WebhookEvent::Message(envelope) = decode_webhook(&body) else {
            panic!("expected message event");
        };
        assert_eq!(envelope.event, "messages.upsert");
        assert_eq!(envelope.data.key.id, "abc-1");
        assert_eq!(envelope.data.message.text(), Some("Quero saber o preço"));
        assert_eq!(envelope.data.push_name.as_deref(), Some("Pr. João"));
    }

    #[test]
    fn conversation_takes_preference_over_extended_text() {
        let body = message_body(serde_json::json!({
            "conversation": "plain",
            "extendedTextMessage": {"text": "extended"}
        }));
        let WebhookEvent::Message(envelope) = decode_webhook(&body) else {
            panic!("expected message event");
        };
        assert_eq!(envelope.data.message.text(), Some("plain"));
    }

    #[test]
    fn extended_text_is_second_choice() {
        let body = message_body(serde_json::json!({
            "extendedTextMessage": {"text": "extended only"}
        }));
        let WebhookEvent::Message(envelope) = decode_webhook(&body) else {
            panic!("expected message event");
        };
        assert_eq!(envelope.data.message.text(), Some("extended only"));
    }

    #[test]
    fn media_message_has_no_text() {
        let body = message_body(serde_json::json!({
            "imageMessage": {"url": "https://example.com/x.jpg"}
        }));
        let WebhookEvent::Message(envelope) = decode_webhook(&body) else {
            panic!("expected message event");
        };
        assert_eq!(envelope.data.message.text(), None);
    }

    #[test]
    fn malformed_body_is_unrecognized() {
        let body = serde_json::json!({"hello": "world"});
        assert!(matches!(decode_webhook(&body), WebhookEvent::Unrecognized));

        let body = serde_json::json!({"event": "x", "instance": "y", "data": {"nope": true}});
        assert!(matches!(decode_webhook(&body), WebhookEvent::Unrecognized));
    }

    #[test]
    fn phone_extraction_strips_jid_and_non_digits() {
        assert_eq!(extract_phone("5511999990001@s.whatsapp.net"), "5511999990001");
        assert_eq!(extract_phone("+55 11 99999-0001@c.us"), "5511999990001");
        assert_eq!(extract_phone("no-digits@x"), "");
    }
}
