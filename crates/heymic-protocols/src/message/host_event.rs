//! Lifecycle notifications delivered by the host, in no guaranteed order.

use serde::{Deserialize, Serialize};

use crate::types::{TabChange, TabId, TabInfo, WindowId};

/// Keyboard command that toggles the mic for the active tab.
pub const TOGGLE_MIC_COMMAND: &str = "toggle-mic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostEvent {
    TabCreated {
        tab: TabInfo,
    },
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabUpdated {
        tab_id: TabId,
        change: TabChange,
        tab: TabInfo,
    },
    TabRemoved {
        tab_id: TabId,
    },
    /// The host substituted one tab instance for another.
    TabReplaced {
        added_tab_id: TabId,
        removed_tab_id: TabId,
    },
    /// `None` means no browser window has focus.
    WindowFocusChanged {
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    WindowRemoved {
        window_id: WindowId,
    },
    /// Toolbar button pressed while `tab` was active.
    ActionClicked {
        tab: TabInfo,
    },
    /// Keyboard shortcut.
    Command {
        name: String,
    },
}
