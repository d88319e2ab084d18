//! Scripted host failures.

use heymic_protocols::error::HostError;
use heymic_protocols::types::TabId;
use serde::{Deserialize, Serialize};

/// Host operation names, as used in failure scripts and call records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GetTab,
    QueryTabs,
    CreateTab,
    ActivateTab,
    RemoveTab,
    SendToTab,
    GetWindow,
    ListWindows,
    FocusWindow,
    InjectScripts,
    StorageGet,
    StorageSet,
    StorageRemove,
    SetBadge,
    SetPanelOptions,
    OpenPanel,
    SplitView,
}

/// Fail the next `times` calls of `operation` (optionally only for one tab)
/// with a host runtime error carrying `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureScript {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    pub message: String,
    #[serde(default = "default_times")]
    pub times: u32,
}

fn default_times() -> u32 {
    1
}

impl FailureScript {
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            tab_id: None,
            message: message.into(),
            times: 1,
        }
    }

    pub fn for_tab(mut self, tab_id: TabId) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    pub fn times(mut self, times: u32) -> Self {
        self.times = times;
        self
    }

    pub(crate) fn matches(&self, operation: Operation, tab_id: Option<TabId>) -> bool {
        self.times > 0
            && self.operation == operation
            && self.tab_id.is_none_or(|id| Some(id) == tab_id)
    }

    pub(crate) fn fire(&mut self) -> HostError {
        self.times = self.times.saturating_sub(1);
        HostError::runtime(self.message.clone())
    }
}
