//! Companion panel outcomes.

use serde::{Deserialize, Serialize};

use super::TabId;

/// How an open-or-focus request for the companion panel ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PanelOutcome {
    /// The host's docked panel is bound to the anchor tab and shown.
    Docked,
    /// A companion tab next to the anchor hosts the panel.
    CompanionTab { tab_id: TabId, reused: bool },
    /// The anchor is an internal/privileged page; nothing was attempted.
    Restricted,
    /// Every strategy failed.
    GaveUp { reason: String },
}

impl PanelOutcome {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Docked | Self::CompanionTab { .. })
    }
}
