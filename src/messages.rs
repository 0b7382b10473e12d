//! Message-list derivation and the outbound analysis payload.

use serde::{Deserialize, Serialize};

/// Largest batch the analysis backend accepts in one request.
pub const MAX_MESSAGES: usize = 50;

/// Longest single message (in characters) the analysis backend accepts.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Body of `POST <endpoint>`: `{"messages": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub messages: Vec<String>,
}

impl AnalyzeRequest {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Build the payload straight from raw multi-line input.
    pub fn from_raw(raw: &str) -> Self {
        Self::new(split_messages(raw))
    }
}

/// Split raw input on line breaks, dropping blank lines.
///
/// Lines are kept verbatim otherwise; order is the chronological order used
/// by the breakdown list and the line chart.
pub fn split_messages(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Warnings for batches the backend is known to reject.
///
/// The request is still sent; the backend answers with a 4xx which surfaces
/// as a backend error.
pub fn batch_warnings(messages: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();
    if messages.is_empty() {
        warnings.push("no messages to analyze".to_string());
    }
    if messages.len() > MAX_MESSAGES {
        warnings.push(format!(
            "{} messages exceeds the backend limit of {}",
            messages.len(),
            MAX_MESSAGES
        ));
    }
    for (i, msg) in messages.iter().enumerate() {
        let chars = msg.trim().chars().count();
        if chars > MAX_MESSAGE_CHARS {
            warnings.push(format!(
                "message {} has {} characters (limit {})",
                i + 1,
                chars,
                MAX_MESSAGE_CHARS
            ));
        }
    }
    warnings
}
