// src/protocol/codec.rs
// Schema validation gate sitting in front of the dispatcher

use serde_json::Value;
use tracing::warn;

use super::message::ActionMessage;
use super::origin::{classify_origin, OriginVerdict};

#[derive(Debug)]
pub enum Classified {
    Valid(ActionMessage),
    Invalid { reason: String },
}

/// Structural validation only; whitelisting and tool existence are the
/// tool bridge's job, not this one's. Never panics or returns `Err` — bad
/// input must not poison the dispatcher, it is classified and dropped.
pub fn classify(origin: &str, raw: &Value) -> Classified {
    if classify_origin(origin) != OriginVerdict::Trusted {
        warn!(origin, "rejected message from untrusted origin");
        return Classified::Invalid {
            reason: format!("untrusted origin: {origin}"),
        };
    }

    match serde_json::from_value::<ActionMessage>(raw.clone()) {
        Ok(ActionMessage::Response { .. }) => {
            warn!("dropped inbound response message, host-only shape");
            Classified::Invalid {
                reason: "response messages are host-to-guest only".to_string(),
            }
        }
        Ok(msg) => Classified::Valid(msg),
        Err(e) => {
            warn!(error = %e, "malformed action message");
            Classified::Invalid {
                reason: format!("malformed message: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_tool_message_from_trusted_origin() {
        let raw = json!({"type":"tool","toolName":"add","args":{"a":1},"requestId":"r1"});
        let result = classify("null", &raw);
        assert!(matches!(result, Classified::Valid(ActionMessage::Tool { .. })));
    }

    #[test]
    fn rejects_untrusted_origin() {
        let raw = json!({"type":"tool","toolName":"add","args":{"a":1},"requestId":"r1"});
        let result = classify("file:///etc/passwd", &raw);
        assert!(matches!(result, Classified::Invalid { .. }));
    }

    #[test]
    fn rejects_inbound_response_messages() {
        let raw = json!({"type":"response","requestId":"r1","success":true});
        let result = classify("null", &raw);
        assert!(matches!(result, Classified::Invalid { .. }));
    }

    #[test]
    fn rejects_malformed_payload() {
        let raw = json!({"type":"tool","toolName":"add"});
        let result = classify("null", &raw);
        assert!(matches!(result, Classified::Invalid { .. }));
    }
}
