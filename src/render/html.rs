// src/render/html.rs
// HTML Renderer (C5): sandboxed iframe for inline HTML

use super::{MountedResource, RenderContext, SandboxPolicy};
use crate::guest::bridge_script;

pub struct HtmlRenderer;

impl HtmlRenderer {
    /// `sandbox="allow-scripts"` only, content injected via `srcdoc` so the
    /// iframe's origin reports as `"null"`. The guest helper script is
    /// prepended into `<head>` before the payload is used, exactly the
    /// trust anchor the origin validator's `"null"` case relies on. An
    /// empty payload mounts successfully as a blank iframe.
    pub fn mount(html: &str, ctx: &RenderContext) -> MountedResource {
        let srcdoc = inject_bridge(html);
        MountedResource::new(SandboxPolicy::ScriptsOnly, ctx.frame_size, srcdoc)
    }
}

fn inject_bridge(html: &str) -> String {
    let script = bridge_script();

    if let Some(head_end) = html.to_ascii_lowercase().find("</head>") {
        let mut out = String::with_capacity(html.len() + script.len());
        out.push_str(&html[..head_end]);
        out.push_str(&script);
        out.push_str(&html[head_end..]);
        return out;
    }

    if let Some(head_start) = html.to_ascii_lowercase().find("<head>") {
        let insert_at = head_start + "<head>".len();
        let mut out = String::with_capacity(html.len() + script.len());
        out.push_str(&html[..insert_at]);
        out.push_str(&script);
        out.push_str(&html[insert_at..]);
        return out;
    }

    // No <head> at all: wrap with one so the script still runs before the
    // rest of the document parses.
    format!("<head>{script}</head>{html}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FrameSize, ResourceMeta};

    fn ctx() -> RenderContext {
        RenderContext::from_meta(ResourceMeta::default(), FrameSize { width: 800, height: 600 })
    }

    #[test]
    fn injects_script_into_existing_head() {
        let html = "<html><head><title>x</title></head><body>hi</body></html>";
        let mounted = HtmlRenderer::mount(html, &ctx());
        assert!(mounted.content.contains("window.callTool"));
        assert!(mounted.content.find("window.callTool").unwrap() < mounted.content.find("<body>").unwrap());
    }

    #[test]
    fn wraps_bare_html_with_head() {
        let html = "<button onclick=\"callTool('add',{})\">go</button>";
        let mounted = HtmlRenderer::mount(html, &ctx());
        assert!(mounted.content.starts_with("<head>"));
        assert!(mounted.content.contains(html));
    }

    #[test]
    fn empty_payload_mounts_blank() {
        let mounted = HtmlRenderer::mount("", &ctx());
        assert!(!mounted.is_disposed());
    }

    #[test]
    fn uses_scripts_only_sandbox() {
        let mounted = HtmlRenderer::mount("<div/>", &ctx());
        assert_eq!(mounted.sandbox.as_attr(), "allow-scripts");
    }
}
