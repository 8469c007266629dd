// src/config/mod.rs
// Central configuration for the resource runtime

pub mod helpers;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::time::Duration;

lazy_static! {
    pub static ref CONFIG: CoreConfig = CoreConfig::from_env();
}

/// Runtime limits and defaults, composed the way domain config is elsewhere
/// in this codebase: one struct, one `from_env`, env vars with sane defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Default timeout applied to `tool` and `prompt` actions when the
    /// message itself doesn't specify one.
    pub default_action_timeout: Duration,
    /// Max number of pending (in-flight) requests a single mounted resource
    /// may hold before new ones are rejected.
    pub max_pending_per_resource: usize,
    /// Max depth of a remote-dom tree accepted by the reconciler.
    pub max_remote_dom_depth: usize,
    /// Fallback iframe size when `meta.preferred-frame-size` is absent.
    pub default_frame_width: u32,
    pub default_frame_height: u32,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // don't panic if .env doesn't exist
        Self {
            default_action_timeout: Duration::from_secs(helpers::env_u64(
                "MCP_UI_DEFAULT_TIMEOUT_SECS",
                30,
            )),
            max_pending_per_resource: helpers::env_usize("MCP_UI_MAX_PENDING", 256),
            max_remote_dom_depth: helpers::env_usize("MCP_UI_MAX_DOM_DEPTH", 64),
            default_frame_width: helpers::env_usize("MCP_UI_DEFAULT_WIDTH", 800) as u32,
            default_frame_height: helpers::env_usize("MCP_UI_DEFAULT_HEIGHT", 600) as u32,
        }
    }
}
