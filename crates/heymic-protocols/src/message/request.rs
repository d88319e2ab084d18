//! Named requests from UI surfaces and page-side listeners.

use serde::{Deserialize, Serialize};

use crate::types::{TabId, WindowId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetActiveTargetTab {
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    ListTabs {
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    SwitchTab {
        tab_id: TabId,
    },
    CloseTab {
        tab_id: TabId,
    },
    OpenTab {
        url: String,
    },
    GetMicState {
        tab_id: TabId,
    },
    GetMicEnabledTab,
    EnableMicForTab {
        tab_id: TabId,
    },
    DisableMicForTab {
        tab_id: TabId,
    },
    /// Stop every other tab; the sending tab keeps the mic.
    StopAllMics,
    DisableAll,
    GetTabSession {
        tab_id: TabId,
    },
    ResetSession {
        tab_id: TabId,
    },
    /// Falls back to the sending tab when `tab_id` is absent.
    GetConversationLog {
        #[serde(default)]
        tab_id: Option<TabId>,
    },
    GetContextLimits,
    OpenCompanionPanel {
        tab_id: TabId,
    },
    GetDomEffects,
    SetDomEffects {
        #[serde(default)]
        tab_id: Option<TabId>,
        enabled: bool,
    },
    GetDomLiftScale,
    SetDomLiftScale {
        scale: f64,
    },
}

impl Request {
    /// Request name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetActiveTargetTab { .. } => "getActiveTargetTab",
            Self::ListTabs { .. } => "listTabs",
            Self::SwitchTab { .. } => "switchTab",
            Self::CloseTab { .. } => "closeTab",
            Self::OpenTab { .. } => "openTab",
            Self::GetMicState { .. } => "getMicState",
            Self::GetMicEnabledTab => "getMicEnabledTab",
            Self::EnableMicForTab { .. } => "enableMicForTab",
            Self::DisableMicForTab { .. } => "disableMicForTab",
            Self::StopAllMics => "stopAllMics",
            Self::DisableAll => "disableAll",
            Self::GetTabSession { .. } => "getTabSession",
            Self::ResetSession { .. } => "resetSession",
            Self::GetConversationLog { .. } => "getConversationLog",
            Self::GetContextLimits => "getContextLimits",
            Self::OpenCompanionPanel { .. } => "openCompanionPanel",
            Self::GetDomEffects => "getDomEffects",
            Self::SetDomEffects { .. } => "setDomEffects",
            Self::GetDomLiftScale => "getDomLiftScale",
            Self::SetDomLiftScale { .. } => "setDomLiftScale",
        }
    }
}
