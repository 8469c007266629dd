// src/protocol/message.rs
// Wire types for the iframe <-> host postMessage channel

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    SelfTarget,
}

impl std::fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Blank => "_blank",
            Self::SelfTarget => "_self",
        })
    }
}

/// Inbound (guest -> host) and outbound (host -> guest) message shapes,
/// tagged by `type` exactly as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionMessage {
    Tool {
        tool_name: String,
        args: Value,
        request_id: String,
    },
    Notify {
        level: NotifyLevel,
        message: String,
    },
    Link {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<LinkTarget>,
    },
    Prompt {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        default_value: Option<String>,
        request_id: String,
    },
    Intent {
        intent: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// Host -> guest only. A host must reject an inbound message of this
    /// shape as invalid rather than route it.
    Response {
        request_id: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl ActionMessage {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Tool { request_id, .. }
            | Self::Prompt { request_id, .. }
            | Self::Response { request_id, .. } => Some(request_id.as_str()),
            Self::Notify { .. } | Self::Link { .. } | Self::Intent { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tool { .. } => "tool",
            Self::Notify { .. } => "notify",
            Self::Link { .. } => "link",
            Self::Prompt { .. } => "prompt",
            Self::Intent { .. } => "intent",
            Self::Response { .. } => "response",
        }
    }
}

/// The outcome of an action. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn into_response(self, request_id: String) -> ActionMessage {
        ActionMessage::Response {
            request_id,
            success: self.success,
            data: self.data,
            error: self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_round_trips() {
        let json = r#"{"type":"tool","toolName":"add","args":{"a":2,"b":3},"requestId":"r1"}"#;
        let msg: ActionMessage = serde_json::from_str(json).unwrap();
        match &msg {
            ActionMessage::Tool {
                tool_name,
                request_id,
                ..
            } => {
                assert_eq!(tool_name, "add");
                assert_eq!(request_id, "r1");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(msg.request_id(), Some("r1"));
        assert_eq!(msg.kind(), "tool");
    }

    #[test]
    fn response_serializes_with_camel_case_fields() {
        let result = ActionResult::err("timeout");
        let msg = result.into_response("r1".to_string());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"requestId\":\"r1\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"timeout\""));
    }

    #[test]
    fn notify_message_parses() {
        let json = r#"{"type":"notify","level":"warning","message":"careful"}"#;
        let msg: ActionMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ActionMessage::Notify {
                level: NotifyLevel::Warning,
                ..
            }
        ));
    }
}
