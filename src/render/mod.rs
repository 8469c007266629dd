// src/render/mod.rs
// Resource Dispatcher (C4) plus the shared renderer types

pub mod dispatch;
pub mod external_url;
pub mod html;
pub mod remote_dom;

pub use dispatch::{classify_resource, RenderTarget};

use crate::resource::{FrameSize, ResourceMeta};

/// Attached by the resource dispatcher so downstream renderers can enforce
/// whitelists and size the iframe without re-reading the original resource.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub frame_size: FrameSize,
    pub meta: ResourceMeta,
}

impl RenderContext {
    pub fn from_meta(meta: ResourceMeta, default: FrameSize) -> Self {
        let frame_size = meta.preferred_frame_size.unwrap_or(default);
        Self { frame_size, meta }
    }
}

/// Sandbox flags a renderer applies to its iframe. Modeled as an explicit
/// type rather than a raw string so the allow-list can't drift from the
/// two sanctioned combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxPolicy {
    /// `allow-scripts` only. No same-origin, no forms, no top navigation.
    ScriptsOnly,
    /// `allow-scripts allow-same-origin`. Used only for external pages
    /// that legitimately need their own cookies/storage/XHR.
    ScriptsAndSameOrigin,
}

impl SandboxPolicy {
    pub fn as_attr(&self) -> &'static str {
        match self {
            Self::ScriptsOnly => "allow-scripts",
            Self::ScriptsAndSameOrigin => "allow-scripts allow-same-origin",
        }
    }
}

/// A mounted HTML or external-URL resource. Exclusively owns its
/// (simulated) iframe and message listener; `dispose()` tears both down.
pub struct MountedResource {
    pub sandbox: SandboxPolicy,
    pub frame_size: FrameSize,
    /// Final iframe content: `srcdoc` text for HTML, or the external URL.
    pub content: String,
    disposed: bool,
}

impl MountedResource {
    pub fn new(sandbox: SandboxPolicy, frame_size: FrameSize, content: String) -> Self {
        Self {
            sandbox,
            frame_size,
            content,
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Synchronous, matching the contract that dispose never suspends.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}
