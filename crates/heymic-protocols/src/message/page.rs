//! Traffic between the coordinator and page-side listeners.

use serde::{Deserialize, Serialize};

/// Instruction sent to a page-side listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PageCommand {
    Activate,
    Stop,
    DomEffects { enabled: bool },
    DomLiftAdjust { scale: f64 },
}

/// Mic state a page-side listener reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicReport {
    Enabled,
    Disabled,
}

/// Kind of system notice a page can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemNotice {
    Mic,
}

/// Event emitted by a page-side listener. The sender tab travels alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PageEvent {
    /// Transcribed user speech or typed text.
    Stt {
        text: String,
        #[serde(default)]
        tokens: Option<u32>,
        #[serde(default)]
        chars: Option<u32>,
    },
    /// Assistant reply.
    Llm {
        text: String,
        #[serde(default)]
        tokens: Option<u32>,
        #[serde(default)]
        chars: Option<u32>,
    },
    System {
        #[serde(rename = "type")]
        notice: SystemNotice,
        state: MicReport,
    },
}
