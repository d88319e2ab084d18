//! Fire-and-forget notifications for every listening UI surface.

use serde::{Deserialize, Serialize};

use crate::types::TabId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BroadcastEvent {
    MicStateChanged {
        tab_id: TabId,
        enabled: bool,
    },
    TabSessionReset {
        tab_id: TabId,
        session_id: String,
        previous_session_id: Option<String>,
        url: Option<String>,
    },
    DomEffectsChanged {
        tab_id: TabId,
        enabled: bool,
    },
    PanelStateChanged {
        tab_id: TabId,
        open: bool,
    },
}

impl BroadcastEvent {
    pub fn mic(tab_id: TabId, enabled: bool) -> Self {
        Self::MicStateChanged { tab_id, enabled }
    }

    pub fn tab_id(&self) -> TabId {
        match self {
            Self::MicStateChanged { tab_id, .. }
            | Self::TabSessionReset { tab_id, .. }
            | Self::DomEffectsChanged { tab_id, .. }
            | Self::PanelStateChanged { tab_id, .. } => *tab_id,
        }
    }
}
