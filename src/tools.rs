// src/tools.rs
// Tool Execution Bridge (C3): whitelist check, parameter sanitization,
// invocation of the external tool runtime.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::protocol::ActionResult;
use crate::resource::ResourceMeta;

/// The external capability that actually runs a named tool. This crate
/// only depends on the invocation contract; the registry, transport, and
/// retry policy behind it are someone else's concern.
#[async_trait]
pub trait ToolRuntime: Send + Sync {
    async fn execute_tool(&self, name: &str, args: Value) -> anyhow::Result<Value>;
}

/// A `ToolRuntime` backed by a plain async closure, for tests and demos.
pub struct FnToolRuntime<F> {
    f: F,
}

impl<F> FnToolRuntime<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> ToolRuntime for FnToolRuntime<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = anyhow::Result<Value>> + Send,
{
    async fn execute_tool(&self, name: &str, args: Value) -> anyhow::Result<Value> {
        (self.f)(name.to_string(), args).await
    }
}

/// Keep only entries whose value is a primitive (`string | number | bool |
/// null`); drop nested objects and arrays, logging each dropped key.
/// Prevents prototype injection, function passing and large object
/// smuggling from untrusted guest code.
pub fn sanitize_args(args: Value) -> Value {
    let Value::Object(map) = args else {
        return Value::Object(Map::new());
    };

    let mut sanitized = Map::with_capacity(map.len());
    for (key, value) in map {
        match &value {
            Value::Object(_) | Value::Array(_) => {
                warn!(key, "dropped non-primitive tool argument");
            }
            _ => {
                sanitized.insert(key, value);
            }
        }
    }
    Value::Object(sanitized)
}

pub struct ToolBridge;

impl ToolBridge {
    /// Whitelist check, sanitize, invoke, wrap. The dispatcher's timeout
    /// envelops this call; the bridge itself never times out or retries.
    pub async fn invoke(
        meta: &ResourceMeta,
        tool_name: &str,
        args: Value,
        runtime: &dyn ToolRuntime,
    ) -> ActionResult {
        if !meta.is_tool_allowed(tool_name) {
            warn!(tool_name, "tool not whitelisted for this resource");
            return ActionResult::err("tool not whitelisted");
        }

        let sanitized = sanitize_args(args);

        match runtime.execute_tool(tool_name, sanitized).await {
            Ok(data) => ActionResult::ok(Some(data)),
            Err(e) => ActionResult::err(e.to_string()),
        }
    }
}
