// src/resource.rs
// UIResource and its supporting types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{CoreError, Result};

/// The three recognized resource MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeKind {
    #[serde(rename = "text/html")]
    Html,
    #[serde(rename = "text/uri-list")]
    UriList,
    #[serde(rename = "application/vnd.mcp-ui.remote-dom+javascript")]
    RemoteDom,
}

impl MimeKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "text/html" => Ok(Self::Html),
            "text/uri-list" => Ok(Self::UriList),
            "application/vnd.mcp-ui.remote-dom+javascript" => Ok(Self::RemoteDom),
            other => Err(CoreError::UnsupportedMime(other.to_string())),
        }
    }
}

/// Exactly one of text/blob, enforced at construction rather than left as
/// two optional fields.
#[derive(Debug, Clone)]
pub enum ResourcePayload {
    Text(String),
    Blob(Vec<u8>),
}

impl ResourcePayload {
    /// The payload as UTF-8 text. Blobs are not decoded here; callers that
    /// need text (HTML/uri-list/remote-dom all require it) call `as_text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Blob(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Open key-value mapping with a couple of recognized, typed keys and an
/// escape hatch for everything else, the way domain configs in this
/// codebase keep a typed core plus a flattened remainder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceMeta {
    #[serde(rename = "preferred-frame-size", skip_serializing_if = "Option::is_none")]
    pub preferred_frame_size: Option<FrameSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ResourceMeta {
    /// `None` means no whitelist restriction; `Some(&[])` means nothing is
    /// callable. The distinction matters for C3's whitelist check.
    pub fn is_tool_allowed(&self, tool_name: &str) -> bool {
        match &self.tools {
            None => true,
            Some(list) => list.iter().any(|t| t == tool_name),
        }
    }
}

/// A structured record the host receives from its MCP layer.
#[derive(Debug, Clone)]
pub struct UIResource {
    pub uri: String,
    pub mime_type: MimeKind,
    pub payload: ResourcePayload,
    pub meta: ResourceMeta,
}

impl UIResource {
    pub fn new(
        uri: impl Into<String>,
        mime_type: MimeKind,
        payload: ResourcePayload,
        meta: ResourceMeta,
    ) -> Result<Self> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(CoreError::MalformedMessage("empty uri".to_string()));
        }
        Ok(Self {
            uri,
            mime_type,
            payload,
            meta,
        })
    }

    /// Build from the wire shape where text/blob arrive as separate
    /// optional fields, rejecting the ambiguous "both present" case rather
    /// than silently preferring one.
    pub fn from_wire(
        uri: impl Into<String>,
        mime_type_raw: &str,
        text: Option<String>,
        blob: Option<Vec<u8>>,
        meta: ResourceMeta,
    ) -> Result<Self> {
        let payload = match (text, blob) {
            (Some(t), None) if !t.is_empty() => ResourcePayload::Text(t),
            (None, Some(b)) if !b.is_empty() => ResourcePayload::Blob(b),
            (Some(_), Some(_)) => return Err(CoreError::AmbiguousPayload),
            _ => return Err(CoreError::MalformedMessage("missing text/blob payload".to_string())),
        };
        Self::new(uri, MimeKind::parse(mime_type_raw)?, payload, meta)
    }
}
