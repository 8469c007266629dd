// src/render/dispatch.rs
// Resource Dispatcher (C4): pure MIME-to-renderer classifier

use crate::error::{CoreError, Result};
use crate::resource::{MimeKind, ResourcePayload, UIResource};

/// One of the three renderer handles plus the payload it needs.
#[derive(Debug, Clone)]
pub enum RenderTarget {
    Html(String),
    /// First line of the text payload; additional lines are advisory and
    /// ignored for rendering.
    ExternalUrl(String),
    RemoteDom(String),
}

pub fn classify_resource(resource: &UIResource) -> Result<RenderTarget> {
    let text = resource.payload.as_text().ok_or_else(|| {
        CoreError::MalformedMessage("renderable resource requires a text payload".to_string())
    });

    match resource.mime_type {
        MimeKind::Html => Ok(RenderTarget::Html(text?.to_string())),
        MimeKind::UriList => {
            let first_line = text?
                .lines()
                .find(|line| !line.trim().is_empty())
                .ok_or_else(|| CoreError::MalformedMessage("empty uri-list".to_string()))?;
            Ok(RenderTarget::ExternalUrl(first_line.trim().to_string()))
        }
        MimeKind::RemoteDom => Ok(RenderTarget::RemoteDom(text?.to_string())),
    }
}
