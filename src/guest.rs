// src/guest.rs
// Guest Helper Script (C9), injected into text/html and remote-dom iframes.
//
// Two manifestations of the same correlation pattern: the literal
// JavaScript text that actually runs inside the sandboxed guest, and a
// Rust client (`GuestBridge`) used by the remote-DOM renderer's
// host-owned event handlers and by tests that play the role of the guest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::protocol::{ActionMessage, LinkTarget, NotifyLevel};

/// The literal bridge script prepended to HTML payloads. Listens only for
/// messages whose `source` is `window.parent`; request/response pairing is
/// by `requestId`, which is not cryptographically significant but suffices
/// because the channel is private to this parent-child pair.
pub fn bridge_script() -> String {
    r#"<script>
(function() {
  const pending = new Map();
  let nextId = 1;

  function send(message) {
    window.parent.postMessage(message, "*");
  }

  function correlated(build, timeoutMs) {
    return new Promise((resolve, reject) => {
      const requestId = "req-" + (nextId++);
      const timer = setTimeout(() => {
        pending.delete(requestId);
        reject(new Error("timeout"));
      }, timeoutMs || 30000);
      pending.set(requestId, { resolve, reject, timer });
      send(build(requestId));
    });
  }

  window.callTool = function(name, args) {
    return correlated((requestId) => ({
      type: "tool", toolName: name, args: args || {}, requestId,
    }));
  };

  window.submitPrompt = function(text, defaultValue) {
    return correlated((requestId) => ({
      type: "prompt", text, defaultValue, requestId,
    }));
  };

  window.notify = function(level, message) {
    send({ type: "notify", level, message });
  };

  window.openLink = function(url, target) {
    send({ type: "link", url, target });
  };

  window.triggerIntent = function(intent, data) {
    send({ type: "intent", intent, data });
  };

  window.addEventListener("message", function(event) {
    if (event.source !== window.parent) return;
    const msg = event.data;
    if (!msg || msg.type !== "response") return;
    const entry = pending.get(msg.requestId);
    if (!entry) return;
    pending.delete(msg.requestId);
    clearTimeout(entry.timer);
    if (msg.success) {
      entry.resolve(msg.data);
    } else {
      entry.reject(new Error(msg.error || "unknown error"));
    }
  });
})();
</script>"#
        .to_string()
}

struct Pending {
    responder: oneshot::Sender<ActionMessage>,
}

/// Rust-side counterpart of the injected script's `pending` map: a
/// `requestId -> oneshot::Sender` table owned by one guest-side client.
#[derive(Clone)]
pub struct GuestBridge {
    outbound: mpsc::Sender<ActionMessage>,
    pending: Arc<Mutex<HashMap<String, Pending>>>,
    default_timeout: Duration,
}

impl GuestBridge {
    pub fn new(outbound: mpsc::Sender<ActionMessage>, default_timeout: Duration) -> Self {
        Self {
            outbound,
            pending: Arc::new(Mutex::new(HashMap::new())),
            default_timeout,
        }
    }

    /// Feed a host -> guest `response` message in; resolves the matching
    /// pending call if one is still waiting. Responses with no matching
    /// entry (already timed out, or a stray message) are ignored.
    pub async fn handle_response(&self, msg: ActionMessage) {
        if let ActionMessage::Response { ref request_id, .. } = msg {
            if let Some(entry) = self.pending.lock().await.remove(request_id) {
                let _ = entry.responder.send(msg);
            }
        }
    }

    async fn correlated(&self, build: impl FnOnce(String) -> ActionMessage) -> Result<Value, String> {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(request_id.clone(), Pending { responder: tx });

        if self.outbound.send(build(request_id.clone())).await.is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err("host channel closed".to_string());
        }

        match tokio::time::timeout(self.default_timeout, rx).await {
            Ok(Ok(ActionMessage::Response { success, data, error, .. })) => {
                if success {
                    Ok(data.unwrap_or(Value::Null))
                } else {
                    Err(error.unwrap_or_else(|| "unknown error".to_string()))
                }
            }
            Ok(Ok(_)) => Err("unexpected message shape".to_string()),
            Ok(Err(_)) => Err("cancelled".to_string()),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                Err("timeout".to_string())
            }
        }
    }

    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value, String> {
        let name = name.to_string();
        self.correlated(move |request_id| ActionMessage::Tool {
            tool_name: name,
            args,
            request_id,
        })
        .await
    }

    pub async fn submit_prompt(
        &self,
        text: &str,
        default_value: Option<String>,
    ) -> Result<Value, String> {
        let text = text.to_string();
        self.correlated(move |request_id| ActionMessage::Prompt {
            text,
            default_value,
            request_id,
        })
        .await
    }

    pub async fn notify(&self, level: NotifyLevel, message: impl Into<String>) {
        let _ = self
            .outbound
            .send(ActionMessage::Notify {
                level,
                message: message.into(),
            })
            .await;
    }

    pub async fn open_link(&self, url: impl Into<String>, target: Option<LinkTarget>) {
        let _ = self
            .outbound
            .send(ActionMessage::Link {
                url: url.into(),
                target,
            })
            .await;
    }

    pub async fn trigger_intent(&self, intent: impl Into<String>, data: Option<Value>) {
        let _ = self
            .outbound
            .send(ActionMessage::Intent {
                intent: intent.into(),
                data,
            })
            .await;
    }
}

/// Not part of the public embedding API; kept for tests that need to
/// assert on the script text.
pub fn bridge_script_exposes(symbol: &str) -> bool {
    bridge_script().contains(&format!("window.{symbol}"))
}
