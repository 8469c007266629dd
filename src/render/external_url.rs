// src/render/external_url.rs
// External URL Renderer (C6): iframe pointing at a third-party origin

use super::{MountedResource, RenderContext, SandboxPolicy};
use crate::error::{CoreError, Result};

pub struct ExternalUrlRenderer;

impl ExternalUrlRenderer {
    /// `src = url`, sandbox relaxed to `allow-scripts allow-same-origin`
    /// since the embedded page legitimately needs its own cookies/storage.
    /// No guest helper is injected: external pages are arbitrary
    /// third-party content, not MCP-UI guests. X-Frame-Options blockage is
    /// not this renderer's concern; a blank iframe is an acceptable
    /// outcome of a valid mount.
    pub fn mount(url: &str, ctx: &RenderContext) -> Result<MountedResource> {
        let parsed = url::Url::parse(url).map_err(|_| CoreError::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CoreError::InvalidUrl(url.to_string()));
        }

        Ok(MountedResource::new(
            SandboxPolicy::ScriptsAndSameOrigin,
            ctx.frame_size,
            url.to_string(),
        ))
    }
}
