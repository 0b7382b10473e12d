//! Crate-level error type.
//!
//! Every failure that can end a pipeline run maps onto one variant. The web
//! server reports [`ViewError::kind`] to the page so it can tell a dead
//! backend apart from a backend that answered badly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// The request never completed (connection refused, DNS, timeout).
    #[error("connection failed to {url}: {detail}")]
    Transport { url: String, detail: String },

    /// The backend replied with a non-2xx status.
    #[error("backend returned HTTP {status}: {detail}")]
    Backend { status: u16, detail: String },

    /// The backend replied 2xx but the body does not match the analysis schema.
    #[error("malformed analysis result: {0}")]
    Malformed(String),

    /// Another pipeline run is still waiting on the backend.
    #[error("an analysis is already in progress")]
    Busy,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewError {
    /// Short stable tag used in JSON error replies.
    pub fn kind(&self) -> &'static str {
        match self {
            ViewError::Transport { .. } => "transport",
            ViewError::Backend { .. } => "backend",
            ViewError::Malformed(_) => "malformed",
            ViewError::Busy => "busy",
            ViewError::Config(_) => "config",
            ViewError::Io(_) => "io",
        }
    }

    /// Message shown to the user when a run aborts.
    pub fn user_notice(&self) -> String {
        match self {
            ViewError::Transport { .. } => {
                "Could not connect to the analysis backend. Is it running?".to_string()
            }
            ViewError::Backend { status, .. } => {
                format!("The analysis backend reported an error (HTTP {status}).")
            }
            ViewError::Malformed(_) => {
                "The analysis backend returned an unexpected response.".to_string()
            }
            ViewError::Busy => "An analysis is already running. Please wait.".to_string(),
            other => other.to_string(),
        }
    }
}
