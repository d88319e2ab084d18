//! Conversation log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRole {
    You,
    Assistant,
    System,
}

/// One line of a session's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub role: LogRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub approx_tokens: u32,
    pub chars: u32,
}

impl LogEntry {
    /// Create an entry stamped now, estimating size fields that were not supplied.
    pub fn new(
        role: LogRole,
        text: impl Into<String>,
        tokens: Option<u32>,
        chars: Option<u32>,
    ) -> Self {
        let text = text.into();
        let chars = chars.unwrap_or_else(|| text.chars().count() as u32);
        let approx_tokens = tokens.unwrap_or_else(|| estimate_tokens(&text));
        Self {
            role,
            text,
            timestamp: Utc::now(),
            approx_tokens,
            chars,
        }
    }
}

/// Rough token estimate: one token per four characters, at least one for non-empty text.
pub fn estimate_tokens(text: &str) -> u32 {
    let len = text.chars().count() as u32;
    if len == 0 {
        return 0;
    }
    len.div_ceil(4).max(1)
}
