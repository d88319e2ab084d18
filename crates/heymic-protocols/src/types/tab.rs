//! Tab and window descriptions as reported by the host.

use serde::{Deserialize, Serialize};

/// Stable integer identity the host assigns to a tab.
pub type TabId = i64;

/// Stable integer identity the host assigns to a window.
pub type WindowId = i64;

/// A tab as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub index: u32,
    /// Committed address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// In-flight address while a navigation has not committed yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    /// Create a tab description with a committed address.
    pub fn new(id: TabId, window_id: WindowId, url: impl Into<String>) -> Self {
        Self {
            id,
            window_id,
            index: 0,
            url: Some(url.into()),
            pending_url: None,
            title: String::new(),
            active: false,
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_pending_url(mut self, url: impl Into<String>) -> Self {
        self.pending_url = Some(url.into());
        self
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Every non-empty address the tab currently reports, committed first.
    pub fn candidate_urls(&self) -> impl Iterator<Item = &str> {
        self.url
            .as_deref()
            .into_iter()
            .chain(self.pending_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// The address a navigation is heading to, falling back to the committed one.
    pub fn best_known_url(&self) -> Option<&str> {
        self.pending_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.url.as_deref().filter(|u| !u.is_empty()))
    }

    pub fn summary(&self) -> TabSummary {
        TabSummary {
            id: self.id,
            title: self.title.clone(),
            url: self.url.clone(),
            window_id: self.window_id,
        }
    }
}

/// Compact tab view handed to UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSummary {
    pub id: TabId,
    pub title: String,
    pub url: Option<String>,
    pub window_id: WindowId,
}

/// Kind of browser window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Normal,
    Popup,
    Panel,
    App,
    Devtools,
}

/// A window as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: WindowId,
    pub kind: WindowKind,
    #[serde(default)]
    pub focused: bool,
}

impl WindowInfo {
    pub fn normal(id: WindowId) -> Self {
        Self {
            id,
            kind: WindowKind::Normal,
            focused: false,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.kind == WindowKind::Normal
    }
}

/// Filter for tab queries. Empty filter matches every tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl TabQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_window(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            active: None,
        }
    }

    pub fn active_in(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            active: Some(true),
        }
    }

    pub fn matches(&self, tab: &TabInfo) -> bool {
        self.window_id.is_none_or(|w| w == tab.window_id)
            && self.active.is_none_or(|a| a == tab.active)
    }
}

/// Properties for creating a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTabProps {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default)]
    pub active: bool,
}

impl CreateTabProps {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            window_id: None,
            index: None,
            active: true,
        }
    }

    /// Place the new tab directly after `anchor` in the anchor's window.
    pub fn adjacent_to(mut self, anchor: &TabInfo) -> Self {
        self.window_id = Some(anchor.window_id);
        self.index = Some(anchor.index + 1);
        self
    }
}

/// Loading status reported with a tab update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// The changed properties carried by a tab update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TabChange {
    pub fn loading(url: Option<&str>) -> Self {
        Self {
            status: Some(TabStatus::Loading),
            url: url.map(str::to_string),
        }
    }

    pub fn complete() -> Self {
        Self {
            status: Some(TabStatus::Complete),
            url: None,
        }
    }
}
