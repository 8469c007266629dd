// src/bin/demo.rs
// Exercises a host session end-to-end against an in-memory tool runtime.
// Not part of the public library surface.

use std::sync::Arc;

use anyhow::Result;
use mcp_ui_core::{HostEvent, HostSession, MimeKind, ResourceMeta, ResourcePayload, UIResource};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

struct AddRuntime;

#[async_trait::async_trait]
impl mcp_ui_core::tools::ToolRuntime for AddRuntime {
    async fn execute_tool(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        match name {
            "add" => {
                let a = args["a"].as_i64().unwrap_or(0);
                let b = args["b"].as_i64().unwrap_or(0);
                Ok(json!(a + b))
            }
            other => anyhow::bail!("unknown tool: {other}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let resource = UIResource::new(
        "ui://demo",
        MimeKind::Html,
        ResourcePayload::Text(
            "<button onclick=\"callTool('add',{a:2,b:3})\">go</button>".to_string(),
        ),
        ResourceMeta::default(),
    )?;

    let (session, mut events) = HostSession::mount(&resource, Arc::new(AddRuntime))?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                HostEvent::Result { request_id, result } => {
                    info!(request_id, success = result.success, "tool result");
                }
                HostEvent::Notify { level, message } => info!(?level, message, "notify"),
                HostEvent::Action { kind, .. } => info!(kind, "action"),
                HostEvent::Error { message } => tracing::error!(message, "error"),
            }
        }
    });

    let raw = json!({"type":"tool","toolName":"add","args":{"a":2,"b":3},"requestId":"r1"});
    session.handle_inbound("null", &raw).await;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(())
}
