// src/error.rs
// Standardized error type for the crate

use thiserror::Error;

/// Errors raised while classifying, dispatching or rendering a resource.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("rejected origin: {0}")]
    InvalidOrigin(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("tool not whitelisted: {0}")]
    ToolNotWhitelisted(String),

    #[error("tool execution failed: {0}")]
    ToolError(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("unsupported mime type: {0}")]
    UnsupportedMime(String),

    #[error("both text and blob payload set")]
    AmbiguousPayload,

    #[error("remote-dom deserialization error: {0}")]
    RemoteDomDecode(String),

    #[error("remote-dom tree exceeds max depth ({0})")]
    RemoteDomTooDeep(usize),

    #[error("resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    #[error("renderer already disposed")]
    Disposed,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Convert to the user-facing string carried on an `ActionResult::error`.
    pub fn to_user_string(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = CoreError::InvalidOrigin("file://evil".to_string());
        assert_eq!(err.to_string(), "rejected origin: file://evil");
    }
}
