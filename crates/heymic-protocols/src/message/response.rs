//! Replies to [`Request`](super::Request)s.

use serde::Serialize;

use crate::types::{LogEntry, PanelOutcome, TabId, TabSummary};

/// Reply payload. Serialized without a tag so each shape matches what the
/// UI surfaces read directly (`{enabled}`, `{ok}`, `{tab}` ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Tab {
        tab: Option<TabSummary>,
    },
    Tabs {
        tabs: Vec<TabSummary>,
    },
    Opened {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    MicState {
        enabled: bool,
    },
    Session {
        #[serde(rename = "sessionId")]
        session_id: String,
        url: Option<String>,
    },
    Log {
        entries: Vec<LogEntry>,
    },
    ContextLimits {
        #[serde(rename = "windowTokens")]
        window_tokens: u32,
    },
    DomEffects {
        ok: bool,
        enabled: bool,
        #[serde(rename = "tabId")]
        tab_id: Option<TabId>,
        injected: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    DomEffectsState {
        enabled: bool,
    },
    LiftScale {
        scale: f64,
    },
    Panel {
        ok: bool,
        outcome: PanelOutcome,
    },
    Ack {
        ok: bool,
    },
    Error {
        ok: bool,
        error: String,
    },
}

impl Response {
    pub fn ok() -> Self {
        Self::Ack { ok: true }
    }

    pub fn not_ok() -> Self {
        Self::Ack { ok: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            ok: false,
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
