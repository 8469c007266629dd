// src/host.rs
// Host-Side Action Loop (C8): thin orchestrator tying the resource
// dispatcher, a mounted renderer, and the action dispatcher together, and
// surfacing four outward events to the embedding application.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::CONFIG;
use crate::dispatcher::{DispatchEvent, Dispatcher};
use crate::error::{CoreError, Result};
use crate::guest::GuestBridge;
use crate::protocol::{classify, ActionResult, Classified, NotifyLevel};
use crate::render::remote_dom::{RemoteDomRenderer, RemoteNode};
use crate::render::{classify_resource, MountedResource, RenderContext, RenderTarget};
use crate::render::{external_url::ExternalUrlRenderer, html::HtmlRenderer};
use crate::resource::{FrameSize, UIResource};
use crate::tools::ToolRuntime;

/// The four outward events the embedding host app observes.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Action { kind: String, payload: Value },
    Result { request_id: String, result: ActionResult },
    Notify { level: NotifyLevel, message: String },
    Error { message: String },
}

enum Mounted {
    Html(MountedResource),
    ExternalUrl(MountedResource),
    RemoteDom(RemoteDomRenderer),
}

async fn emit(events: &mpsc::Sender<HostEvent>, event: DispatchEvent) {
    let host_event = match event {
        DispatchEvent::Result { request_id, result } => HostEvent::Result { request_id, result },
        DispatchEvent::Notify { level, message } => HostEvent::Notify { level, message },
        DispatchEvent::Link { url, target } => HostEvent::Action {
            kind: "link".to_string(),
            payload: json!({ "url": url, "target": target }),
        },
        DispatchEvent::Intent { intent, data } => HostEvent::Action {
            kind: "intent".to_string(),
            payload: json!({ "intent": intent, "data": data }),
        },
    };
    let _ = events.send(host_event).await;
}

/// Accepts a `UIResource`, asks the resource dispatcher for a renderer,
/// mounts it, and owns the action dispatcher for that renderer's lifetime.
pub struct HostSession {
    dispatcher: Arc<Dispatcher>,
    runtime: Arc<dyn ToolRuntime>,
    events: mpsc::Sender<HostEvent>,
    mounted: Mounted,
}

impl HostSession {
    pub fn mount(
        resource: &UIResource,
        runtime: Arc<dyn ToolRuntime>,
    ) -> Result<(Self, mpsc::Receiver<HostEvent>)> {
        let ctx = RenderContext::from_meta(
            resource.meta.clone(),
            FrameSize {
                width: CONFIG.default_frame_width,
                height: CONFIG.default_frame_height,
            },
        );

        let dispatcher = Arc::new(Dispatcher::new(resource.meta.clone()));
        let (events, rx) = mpsc::channel(128);

        let mounted = match classify_resource(resource)? {
            RenderTarget::Html(html) => Mounted::Html(HtmlRenderer::mount(&html, &ctx)),
            RenderTarget::ExternalUrl(url) => {
                Mounted::ExternalUrl(ExternalUrlRenderer::mount(&url, &ctx)?)
            }
            RenderTarget::RemoteDom(text) => {
                let root: RemoteNode = serde_json::from_str(&text)
                    .map_err(|e| CoreError::RemoteDomDecode(e.to_string()))?;

                // The renderer's bound event handlers post through a
                // GuestBridge exactly as an actual sandboxed guest would;
                // a forwarder task feeds whatever it sends back through
                // the same dispatcher used for normal inbound traffic.
                let (guest_tx, mut guest_rx) = mpsc::channel(CONFIG.max_pending_per_resource);
                let bridge = GuestBridge::new(guest_tx, CONFIG.default_action_timeout);

                let forward_dispatcher = dispatcher.clone();
                let forward_runtime = runtime.clone();
                let forward_events = events.clone();
                tokio::spawn(async move {
                    while let Some(msg) = guest_rx.recv().await {
                        if let Some(event) =
                            forward_dispatcher.dispatch(msg, forward_runtime.as_ref()).await
                        {
                            emit(&forward_events, event).await;
                        }
                    }
                });

                let mut renderer = RemoteDomRenderer::new(CONFIG.max_remote_dom_depth, Some(bridge));
                renderer.materialize(root)?;
                Mounted::RemoteDom(renderer)
            }
        };

        Ok((
            Self {
                dispatcher,
                runtime,
                events,
                mounted,
            },
            rx,
        ))
    }

    /// Mount, surfacing any failure as an `onError` event on a
    /// pre-allocated channel instead of returning `Err`, for hosts that
    /// prefer a uniform event stream over branching on the mount result.
    pub fn mount_or_report(
        resource: &UIResource,
        runtime: Arc<dyn ToolRuntime>,
    ) -> (Option<Self>, mpsc::Receiver<HostEvent>) {
        match Self::mount(resource, runtime) {
            Ok((session, rx)) => (Some(session), rx),
            Err(e) => {
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.try_send(HostEvent::Error {
                    message: e.to_string(),
                });
                (None, rx)
            }
        }
    }

    /// Entry point standing in for the host window's `message` listener.
    /// Bad input is classified and dropped; it never reaches a handler.
    pub async fn handle_inbound(&self, origin: &str, raw: &Value) {
        match classify(origin, raw) {
            Classified::Valid(msg) => {
                if let Some(event) = self.dispatcher.dispatch(msg, self.runtime.as_ref()).await {
                    emit(&self.events, event).await;
                }
            }
            Classified::Invalid { reason } => {
                warn!(reason, "dropped invalid inbound message");
            }
        }
    }

    /// Fire a remote-dom node's bound event handler, if this session is
    /// mounting a remote-dom resource. No-op for html/external-url.
    pub async fn fire_remote_dom_handler(
        &self,
        node_id: &str,
        event: &str,
        payload: Option<Value>,
    ) -> Result<()> {
        match &self.mounted {
            Mounted::RemoteDom(renderer) => renderer.fire_handler(node_id, event, payload).await,
            _ => Ok(()),
        }
    }

    /// Dispose the mounted renderer and cancel its in-flight requests
    /// locally. After this, no subsequent call produces postMessage
    /// traffic.
    pub async fn dispose(&mut self) {
        self.dispatcher.cancel_all().await;
        match &mut self.mounted {
            Mounted::Html(m) | Mounted::ExternalUrl(m) => m.dispose(),
            Mounted::RemoteDom(r) => r.dispose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{MimeKind, ResourceMeta, ResourcePayload};
    use crate::tools::FnToolRuntime;

    fn add_runtime() -> Arc<dyn ToolRuntime> {
        Arc::new(FnToolRuntime::new(|_name: String, args: Value| async move {
            let a = args["a"].as_i64().unwrap_or(0);
            let b = args["b"].as_i64().unwrap_or(0);
            Ok(json!(a + b))
        }))
    }

    #[tokio::test]
    async fn html_tool_call_round_trips_through_session() {
        let resource = UIResource::new(
            "ui://t",
            MimeKind::Html,
            ResourcePayload::Text("<button>go</button>".to_string()),
            ResourceMeta::default(),
        )
        .unwrap();

        let (session, mut rx) = HostSession::mount(&resource, add_runtime()).unwrap();
        let raw = json!({"type":"tool","toolName":"add","args":{"a":2,"b":3},"requestId":"r1"});
        session.handle_inbound("null", &raw).await;

        let event = rx.recv().await.unwrap();
        match event {
            HostEvent::Result { request_id, result } => {
                assert_eq!(request_id, "r1");
                assert_eq!(result.data.unwrap(), json!(5));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn untrusted_origin_produces_no_event() {
        let resource = UIResource::new(
            "ui://t",
            MimeKind::Html,
            ResourcePayload::Text("<div/>".to_string()),
            ResourceMeta::default(),
        )
        .unwrap();
        let (session, mut rx) = HostSession::mount(&resource, add_runtime()).unwrap();
        let raw = json!({"type":"tool","toolName":"add","args":{},"requestId":"r1"});
        session.handle_inbound("file:///etc/passwd", &raw).await;

        let outcome = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
        assert!(outcome.is_err(), "rejected origin must not produce an event");
    }

    #[tokio::test]
    async fn unsupported_mime_fails_mount() {
        let resource = UIResource::new(
            "ui://t",
            MimeKind::UriList,
            ResourcePayload::Text("".to_string()),
            ResourceMeta::default(),
        )
        .unwrap();
        let (session, mut rx) = HostSession::mount_or_report(&resource, add_runtime());
        assert!(session.is_none());
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, HostEvent::Error { .. }));
    }

    #[tokio::test]
    async fn remote_dom_handler_fires_through_bridge_back_into_dispatcher() {
        let tree = RemoteNode {
            id: "root".to_string(),
            node_type: "button".to_string(),
            props: {
                let mut p = std::collections::HashMap::new();
                p.insert("onClick".to_string(), json!("tool:add"));
                p
            },
            children: crate::render::remote_dom::NodeChildren::Text("go".to_string()),
        };
        let resource = UIResource::new(
            "ui://t",
            MimeKind::RemoteDom,
            ResourcePayload::Text(serde_json::to_string(&tree).unwrap()),
            ResourceMeta::default(),
        )
        .unwrap();

        let (session, mut rx) = HostSession::mount(&resource, add_runtime()).unwrap();
        session
            .fire_remote_dom_handler("root", "click", Some(json!({"a": 2, "b": 3})))
            .await
            .unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            HostEvent::Result { result, .. } => assert_eq!(result.data.unwrap(), json!(5)),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
