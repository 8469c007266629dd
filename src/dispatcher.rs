// src/dispatcher.rs
// Action Dispatcher (C2): routes validated actions to per-type handlers
// and owns request/response correlation.
//
// The `requestId -> oneshot::Sender` table is the same shape this codebase
// uses for MCP reply correlation: an `Arc<RwLock<HashMap<String,
// oneshot::Sender<_>>>>` populated on request arrival and drained on
// settlement, timeout, or teardown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{oneshot, RwLock};
use tracing::{info, warn};

use crate::config::CONFIG;
use crate::protocol::{ActionMessage, ActionResult, NotifyLevel};
use crate::resource::ResourceMeta;
use crate::tools::{ToolBridge, ToolRuntime};

/// Correlation record held while awaiting a tool/prompt result.
struct PendingRequest {
    tool_name: Option<String>,
    created_at: Instant,
    timeout: Duration,
    responder: oneshot::Sender<ActionResult>,
}

/// Side effects surfaced to the embedding host for fire-and-forget actions
/// and for completed/failed correlated ones.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    Result { request_id: String, result: ActionResult },
    Notify { level: NotifyLevel, message: String },
    Link { url: String, target: Option<String> },
    Intent { intent: String, data: Option<Value> },
}

/// Owns the pending-request table for one mounted resource. Not shared
/// across resources: the table is explicit context passed at bootstrap
/// rather than a module-level singleton, so it stays testable in isolation.
pub struct Dispatcher {
    pending: Arc<RwLock<HashMap<String, PendingRequest>>>,
    meta: ResourceMeta,
    action_timeout: Duration,
}

impl Dispatcher {
    pub fn new(meta: ResourceMeta) -> Self {
        Self::with_timeout(meta, CONFIG.default_action_timeout)
    }

    /// Construct with an explicit action timeout instead of
    /// `CONFIG.default_action_timeout`; used by hosts with a tighter
    /// deadline and by tests that need to observe the timeout path without
    /// waiting out the configured default.
    pub fn with_timeout(meta: ResourceMeta, action_timeout: Duration) -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            meta,
            action_timeout,
        }
    }

    /// Route one already-classified message. Returns `Some(event)` for
    /// anything the host should surface; tool/prompt completions arrive
    /// asynchronously via the channel passed to `handle_tool`/`handle_prompt`
    /// instead, since those await the runtime.
    pub async fn dispatch(
        &self,
        msg: ActionMessage,
        runtime: &dyn ToolRuntime,
    ) -> Option<DispatchEvent> {
        match msg {
            ActionMessage::Tool {
                tool_name,
                args,
                request_id,
            } => {
                let result = self
                    .run_correlated(
                        request_id.clone(),
                        Some(tool_name.clone()),
                        self.action_timeout,
                        ToolBridge::invoke(&self.meta, &tool_name, args, runtime),
                    )
                    .await;
                Some(DispatchEvent::Result { request_id, result })
            }
            ActionMessage::Prompt {
                request_id,
                text,
                default_value,
            } => {
                // No interactive host is wired in the core; a prompt
                // resolves immediately with the default, mirroring a host
                // that has no UI attached yet. Embedding hosts override
                // this by racing their own future against the same table
                // via `register_pending`/`resolve`.
                let _ = text;
                let result = ActionResult::ok(default_value.map(|v| Value::String(v)));
                Some(DispatchEvent::Result { request_id, result })
            }
            ActionMessage::Notify { level, message } => {
                Some(DispatchEvent::Notify { level, message })
            }
            ActionMessage::Link { url, target } => Some(DispatchEvent::Link {
                url,
                target: target.map(|t| t.to_string()),
            }),
            ActionMessage::Intent { intent, data } => {
                Some(DispatchEvent::Intent { intent, data })
            }
            ActionMessage::Response { .. } => {
                warn!("dispatcher received a response-shaped message, ignoring");
                None
            }
        }
    }

    /// Insert a pending record, then race the handler future itself
    /// against the timeout and against external cancellation
    /// (`cancel_all` resolving this entry's `responder`), releasing the
    /// record regardless of which wins. The handler future is polled
    /// in-place rather than on a detached task: it borrows `self.meta`
    /// and the caller's `runtime`, neither of which is `'static`, so it
    /// cannot be handed to `tokio::spawn`.
    async fn run_correlated(
        &self,
        request_id: String,
        tool_name: Option<String>,
        timeout: Duration,
        fut: impl std::future::Future<Output = ActionResult>,
    ) -> ActionResult {
        if self.pending.read().await.len() >= CONFIG.max_pending_per_resource {
            warn!(request_id, "pending request table full, rejecting");
            return ActionResult::err("resource limit exceeded");
        }

        let (tx, cancel_rx) = oneshot::channel();
        self.pending.write().await.insert(
            request_id.clone(),
            PendingRequest {
                tool_name,
                created_at: Instant::now(),
                timeout,
                responder: tx,
            },
        );

        tokio::pin!(fut);
        tokio::pin!(cancel_rx);
        let result = tokio::select! {
            result = &mut fut => {
                self.pending.write().await.remove(&request_id);
                result
            }
            cancelled = &mut cancel_rx => {
                self.pending.write().await.remove(&request_id);
                cancelled.unwrap_or_else(|_| ActionResult::err("cancelled"))
            }
            _ = tokio::time::sleep(timeout) => {
                self.pending.write().await.remove(&request_id);
                warn!(request_id, "tool/prompt request timed out");
                ActionResult::err("timeout")
            }
        };
        result
    }

    /// Drain every pending record, resolving each locally to `cancelled`
    /// without attempting to post anywhere. Called on renderer teardown.
    pub async fn cancel_all(&self) {
        let mut table = self.pending.write().await;
        let count = table.len();
        for (_, entry) in table.drain() {
            let _ = entry.responder.send(ActionResult::err("cancelled"));
        }
        if count > 0 {
            info!(count, "cancelled pending requests on teardown");
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FnToolRuntime;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    fn instant_runtime() -> FnToolRuntime<impl Fn(String, Value) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<Value>> + Send>>> {
        FnToolRuntime::new(|name, _args| Box::pin(async move { Ok(json!({"echo": name})) }))
    }

    #[tokio::test]
    async fn tool_call_resolves_with_result() {
        let dispatcher = Dispatcher::new(ResourceMeta::default());
        let runtime = instant_runtime();
        let msg = ActionMessage::Tool {
            tool_name: "add".to_string(),
            args: json!({"a": 2, "b": 3}),
            request_id: "r1".to_string(),
        };
        let event = dispatcher.dispatch(msg, &runtime).await.unwrap();
        match event {
            DispatchEvent::Result { request_id, result } => {
                assert_eq!(request_id, "r1");
                assert!(result.success);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(dispatcher.pending_count().await, 0);
    }

    #[tokio::test]
    async fn hanging_tool_times_out() {
        let dispatcher = Dispatcher::new(ResourceMeta::default());
        let runtime = FnToolRuntime::new(|_name: String, _args: Value| async {
            tokio::time::sleep(StdDuration::from_secs(60)).await;
            Ok(json!(null))
        });

        let result = dispatcher
            .run_correlated(
                "r2".to_string(),
                Some("slow".to_string()),
                StdDuration::from_millis(50),
                ToolBridge::invoke(&ResourceMeta::default(), "slow", json!({}), &runtime),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "timeout");
        assert_eq!(dispatcher.pending_count().await, 0);
    }

    #[tokio::test]
    async fn notify_action_has_no_correlation() {
        let dispatcher = Dispatcher::new(ResourceMeta::default());
        let runtime = instant_runtime();
        let msg = ActionMessage::Notify {
            level: NotifyLevel::Warning,
            message: "careful".to_string(),
        };
        let event = dispatcher.dispatch(msg, &runtime).await.unwrap();
        assert!(matches!(event, DispatchEvent::Notify { .. }));
        assert_eq!(dispatcher.pending_count().await, 0);
    }
}
