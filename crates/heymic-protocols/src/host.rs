//! Host capability traits.
//!
//! Every host call suspends the caller, and host events can interleave
//! between any two calls. Implementations report failures as [`HostError`]
//! values instead of panicking; callers decide whether a failure is fatal,
//! recoverable or ignorable.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HostError;
use crate::message::PageCommand;
use crate::types::{CreateTabProps, TabId, TabInfo, TabQuery, WindowId, WindowInfo};

pub type HostResult<T> = Result<T, HostError>;

/// Tab lifecycle and page messaging.
#[async_trait]
pub trait TabsHost: Send + Sync {
    async fn get_tab(&self, tab_id: TabId) -> HostResult<TabInfo>;

    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<TabInfo>>;

    async fn create_tab(&self, props: CreateTabProps) -> HostResult<TabInfo>;

    /// Make the tab the active one in its window.
    async fn activate_tab(&self, tab_id: TabId) -> HostResult<()>;

    async fn remove_tab(&self, tab_id: TabId) -> HostResult<()>;

    /// Deliver a command to the tab's page-side listener, if one exists.
    async fn send_to_tab(&self, tab_id: TabId, command: PageCommand) -> HostResult<()>;
}

/// Window lookup and focus.
#[async_trait]
pub trait WindowsHost: Send + Sync {
    async fn get_window(&self, window_id: WindowId) -> HostResult<WindowInfo>;

    async fn list_normal_windows(&self) -> HostResult<Vec<WindowInfo>>;

    async fn focus_window(&self, window_id: WindowId) -> HostResult<()>;
}

/// Script injection into pages.
#[async_trait]
pub trait ScriptingHost: Send + Sync {
    async fn inject_scripts(&self, tab_id: TabId, files: &[String]) -> HostResult<()>;
}

/// Small key-value persistence that survives restarts.
#[async_trait]
pub trait StorageHost: Send + Sync {
    async fn storage_get(&self, key: &str) -> HostResult<Option<Value>>;

    async fn storage_set(&self, key: &str, value: Value) -> HostResult<()>;

    async fn storage_remove(&self, key: &str) -> HostResult<()>;
}

/// Toolbar button state.
#[async_trait]
pub trait ActionHost: Send + Sync {
    async fn set_badge(&self, tab_id: TabId, enabled: bool) -> HostResult<()>;
}

/// Docked side panel. Optional: not every host offers one.
#[async_trait]
pub trait DockedPanelHost: Send + Sync {
    /// Enable (or disable) the panel for a tab and bind it to `path`.
    async fn set_panel_options(&self, tab_id: TabId, path: &str, enabled: bool) -> HostResult<()>;

    /// Show the panel bound to a tab.
    async fn open_panel(&self, tab_id: TabId, window_id: WindowId) -> HostResult<()>;
}

/// Side-by-side tab layout. Optional and best-effort.
#[async_trait]
pub trait SplitViewHost: Send + Sync {
    async fn split_view(&self, anchor: &TabInfo, companion: &TabInfo) -> HostResult<()>;
}

/// The full set of host capabilities handed to the controller at startup.
#[derive(Clone)]
pub struct HostEnvironment {
    pub tabs: Arc<dyn TabsHost>,
    pub windows: Arc<dyn WindowsHost>,
    pub scripting: Arc<dyn ScriptingHost>,
    pub storage: Arc<dyn StorageHost>,
    pub action: Arc<dyn ActionHost>,
    pub docked_panel: Option<Arc<dyn DockedPanelHost>>,
    pub split_view: Option<Arc<dyn SplitViewHost>>,
}

impl HostEnvironment {
    /// Build an environment from one object providing every required capability.
    ///
    /// Optional capabilities start absent; add them with
    /// [`with_docked_panel`](Self::with_docked_panel) and
    /// [`with_split_view`](Self::with_split_view).
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: TabsHost + WindowsHost + ScriptingHost + StorageHost + ActionHost + 'static,
    {
        Self {
            tabs: host.clone(),
            windows: host.clone(),
            scripting: host.clone(),
            storage: host.clone(),
            action: host,
            docked_panel: None,
            split_view: None,
        }
    }

    pub fn with_docked_panel(mut self, panel: Arc<dyn DockedPanelHost>) -> Self {
        self.docked_panel = Some(panel);
        self
    }

    pub fn with_split_view(mut self, split: Arc<dyn SplitViewHost>) -> Self {
        self.split_view = Some(split);
        self
    }
}
