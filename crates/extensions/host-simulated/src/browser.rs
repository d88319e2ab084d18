//! Tab/window model and host trait implementations.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use heymic_protocols::error::HostError;
use heymic_protocols::host::{
    ActionHost, DockedPanelHost, HostEnvironment, HostResult, ScriptingHost, SplitViewHost,
    StorageHost, TabsHost, WindowsHost,
};
use heymic_protocols::message::{HostEvent, PageCommand};
use heymic_protocols::types::{
    CreateTabProps, TabChange, TabId, TabInfo, TabQuery, WindowId, WindowInfo, WindowKind,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::failure::{FailureScript, Operation};

/// Schemes the simulated host refuses to inject into.
const INTERNAL_SCHEMES: &[&str] = &[
    "about",
    "chrome",
    "chrome-search",
    "chrome-untrusted",
    "devtools",
    "edge",
    "view-source",
];

/// One host call as seen by the simulation, recorded before any scripted
/// failure fires.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub operation: Operation,
    pub tab_id: Option<TabId>,
    pub command: Option<PageCommand>,
}

#[derive(Debug, Clone, Default)]
struct PanelBinding {
    path: String,
    enabled: bool,
    shown: bool,
}

#[derive(Default)]
struct SimState {
    tabs: BTreeMap<TabId, TabInfo>,
    windows: BTreeMap<WindowId, WindowInfo>,
    next_tab_id: TabId,
    next_window_id: WindowId,
    listeners: HashSet<TabId>,
    delivered: Vec<(TabId, PageCommand)>,
    storage: HashMap<String, Value>,
    badges: HashMap<TabId, bool>,
    panels: HashMap<TabId, PanelBinding>,
    splits: Vec<(TabId, TabId)>,
    failures: Vec<FailureScript>,
    calls: Vec<CallRecord>,
}

impl SimState {
    fn begin(
        &mut self,
        operation: Operation,
        tab_id: Option<TabId>,
        command: Option<&PageCommand>,
    ) -> HostResult<()> {
        self.calls.push(CallRecord {
            operation,
            tab_id,
            command: command.cloned(),
        });
        if let Some(script) = self
            .failures
            .iter_mut()
            .find(|s| s.matches(operation, tab_id))
        {
            let err = script.fire();
            debug!(?operation, ?tab_id, %err, "scripted host failure");
            return Err(err);
        }
        self.failures.retain(|s| s.times > 0);
        Ok(())
    }

    fn tab(&self, tab_id: TabId) -> HostResult<&TabInfo> {
        self.tabs.get(&tab_id).ok_or(HostError::NoSuchTab(tab_id))
    }

    fn window(&self, window_id: WindowId) -> HostResult<&WindowInfo> {
        self.windows
            .get(&window_id)
            .ok_or(HostError::NoSuchWindow(window_id))
    }

    fn current_window(&self) -> Option<WindowId> {
        let normal = || self.windows.values().filter(|w| w.is_normal());
        normal()
            .find(|w| w.focused)
            .or_else(|| normal().next())
            .map(|w| w.id)
    }

    fn ensure_window(&mut self, window_id: WindowId) {
        self.windows
            .entry(window_id)
            .or_insert_with(|| WindowInfo::normal(window_id));
        self.next_window_id = self.next_window_id.max(window_id + 1);
    }

    fn tabs_in(&self, window_id: WindowId) -> usize {
        self.tabs.values().filter(|t| t.window_id == window_id).count()
    }

    fn insert_tab(&mut self, tab: TabInfo) {
        self.ensure_window(tab.window_id);
        self.next_tab_id = self.next_tab_id.max(tab.id + 1);
        if tab.active {
            self.deactivate_window(tab.window_id);
        }
        self.tabs.insert(tab.id, tab);
    }

    fn deactivate_window(&mut self, window_id: WindowId) {
        for tab in self.tabs.values_mut().filter(|t| t.window_id == window_id) {
            tab.active = false;
        }
    }

    fn activate(&mut self, tab_id: TabId) -> HostResult<()> {
        let window_id = self.tab(tab_id)?.window_id;
        self.deactivate_window(window_id);
        if let Some(tab) = self.tabs.get_mut(&tab_id) {
            tab.active = true;
        }
        Ok(())
    }

    fn focus(&mut self, window_id: Option<WindowId>) {
        for window in self.windows.values_mut() {
            window.focused = Some(window.id) == window_id;
        }
    }

    fn drop_tab(&mut self, tab_id: TabId) -> Option<TabInfo> {
        let tab = self.tabs.remove(&tab_id)?;
        self.listeners.remove(&tab_id);
        self.badges.remove(&tab_id);
        self.panels.remove(&tab_id);
        self.reindex(tab.window_id);
        Some(tab)
    }

    fn reindex(&mut self, window_id: WindowId) {
        let mut ids: Vec<(u32, TabId)> = self
            .tabs
            .values()
            .filter(|t| t.window_id == window_id)
            .map(|t| (t.index, t.id))
            .collect();
        ids.sort_unstable();
        for (index, (_, id)) in ids.into_iter().enumerate() {
            if let Some(tab) = self.tabs.get_mut(&id) {
                tab.index = index as u32;
            }
        }
    }
}

fn is_internal(url: Option<&str>) -> bool {
    url.and_then(|u| u.split_once(':'))
        .is_some_and(|(scheme, _)| INTERNAL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()))
}

/// In-memory browser implementing every host capability.
pub struct SimulatedBrowser {
    state: Mutex<SimState>,
    latency: Mutex<Option<Duration>>,
}

impl SimulatedBrowser {
    /// A browser with one focused normal window (id 1) and no tabs.
    pub fn new() -> Self {
        let mut state = SimState {
            next_tab_id: 1,
            next_window_id: 1,
            ..Default::default()
        };
        state.ensure_window(1);
        state.focus(Some(1));
        Self {
            state: Mutex::new(state),
            latency: Mutex::new(None),
        }
    }

    /// Host environment with every optional capability present.
    pub fn environment(self: &Arc<Self>) -> HostEnvironment {
        HostEnvironment::from_host(self.clone())
            .with_docked_panel(self.clone())
            .with_split_view(self.clone())
    }

    /// Host environment for a browser without a docked panel or split view.
    pub fn environment_without_panel(self: &Arc<Self>) -> HostEnvironment {
        HostEnvironment::from_host(self.clone())
    }

    /// Delay every host call by `latency`. Without it calls still yield once.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    async fn pause(&self) {
        let latency = *self.latency.lock();
        match latency {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }

    pub fn add_window(&self, kind: WindowKind) -> WindowId {
        let mut state = self.state.lock();
        let id = state.next_window_id;
        state.windows.insert(
            id,
            WindowInfo {
                id,
                kind,
                focused: false,
            },
        );
        state.next_window_id += 1;
        id
    }

    /// Open an active tab at the end of `window_id`. Returns the host's view
    /// of it, ready to be wrapped in a `TabCreated` event.
    pub fn add_tab(&self, window_id: WindowId, url: &str) -> TabInfo {
        let mut state = self.state.lock();
        let tab = TabInfo::new(state.next_tab_id, window_id, url)
            .with_index(state.tabs_in(window_id) as u32)
            .active();
        state.insert_tab(tab.clone());
        tab
    }

    /// Navigate a tab and return the `loading` and `complete` events the
    /// host would deliver for it.
    pub fn navigate(&self, tab_id: TabId, url: &str) -> Vec<HostEvent> {
        let mut state = self.state.lock();
        let Some(tab) = state.tabs.get_mut(&tab_id) else {
            return Vec::new();
        };
        tab.pending_url = Some(url.to_string());
        let loading = HostEvent::TabUpdated {
            tab_id,
            change: TabChange::loading(Some(url)),
            tab: tab.clone(),
        };
        tab.url = Some(url.to_string());
        tab.pending_url = None;
        let complete = HostEvent::TabUpdated {
            tab_id,
            change: TabChange::complete(),
            tab: tab.clone(),
        };
        state.listeners.remove(&tab_id);
        vec![loading, complete]
    }

    /// Bring the model in line with an event the host is about to deliver.
    pub fn apply(&self, event: &HostEvent) {
        let mut state = self.state.lock();
        match event {
            HostEvent::TabCreated { tab } => state.insert_tab(tab.clone()),
            HostEvent::TabActivated { tab_id, .. } => {
                let _ = state.activate(*tab_id);
            }
            HostEvent::TabUpdated { tab, change, .. } => {
                if change.status.is_some() || change.url.is_some() {
                    state.listeners.remove(&tab.id);
                }
                state.insert_tab(tab.clone());
            }
            HostEvent::TabRemoved { tab_id } => {
                state.drop_tab(*tab_id);
            }
            HostEvent::TabReplaced {
                added_tab_id,
                removed_tab_id,
            } => {
                if let Some(mut tab) = state.drop_tab(*removed_tab_id) {
                    tab.id = *added_tab_id;
                    state.insert_tab(tab);
                }
            }
            HostEvent::WindowFocusChanged { window_id } => state.focus(*window_id),
            HostEvent::WindowRemoved { window_id } => {
                let doomed: Vec<TabId> = state
                    .tabs
                    .values()
                    .filter(|t| t.window_id == *window_id)
                    .map(|t| t.id)
                    .collect();
                for id in doomed {
                    state.drop_tab(id);
                }
                state.windows.remove(window_id);
            }
            HostEvent::ActionClicked { .. } | HostEvent::Command { .. } => {}
        }
    }

    pub fn fail(&self, script: FailureScript) {
        self.state.lock().failures.push(script);
    }

    /// Pretend a page-side listener is already running in the tab.
    pub fn install_listener(&self, tab_id: TabId) {
        self.state.lock().listeners.insert(tab_id);
    }

    pub fn has_listener(&self, tab_id: TabId) -> bool {
        self.state.lock().listeners.contains(&tab_id)
    }

    pub fn tab(&self, tab_id: TabId) -> Option<TabInfo> {
        self.state.lock().tabs.get(&tab_id).cloned()
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.state.lock().tabs.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn count_for(&self, operation: Operation, tab_id: TabId) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation && c.tab_id == Some(tab_id))
            .count()
    }

    /// Commands that reached a listener in `tab_id`, oldest first.
    pub fn delivered_to(&self, tab_id: TabId) -> Vec<PageCommand> {
        self.state
            .lock()
            .delivered
            .iter()
            .filter(|(id, _)| *id == tab_id)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn badge(&self, tab_id: TabId) -> Option<bool> {
        self.state.lock().badges.get(&tab_id).copied()
    }

    pub fn panel_shown(&self, tab_id: TabId) -> bool {
        self.state
            .lock()
            .panels
            .get(&tab_id)
            .is_some_and(|p| p.enabled && p.shown)
    }

    pub fn panel_path(&self, tab_id: TabId) -> Option<String> {
        self.state.lock().panels.get(&tab_id).map(|p| p.path.clone())
    }

    pub fn splits(&self) -> Vec<(TabId, TabId)> {
        self.state.lock().splits.clone()
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        self.state.lock().storage.get(key).cloned()
    }
}

impl Default for SimulatedBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabsHost for SimulatedBrowser {
    async fn get_tab(&self, tab_id: TabId) -> HostResult<TabInfo> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::GetTab, Some(tab_id), None)?;
        state.tab(tab_id).cloned()
    }

    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<TabInfo>> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::QueryTabs, None, None)?;
        let mut tabs: Vec<TabInfo> = state
            .tabs
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        tabs.sort_by_key(|t| (t.window_id, t.index));
        Ok(tabs)
    }

    async fn create_tab(&self, props: CreateTabProps) -> HostResult<TabInfo> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::CreateTab, None, None)?;

        let window_id = match props.window_id {
            Some(id) => state.window(id)?.id,
            None => state
                .current_window()
                .ok_or_else(|| HostError::runtime("No current window"))?,
        };
        let count = state.tabs_in(window_id) as u32;
        let index = props.index.unwrap_or(count).min(count);
        for tab in state
            .tabs
            .values_mut()
            .filter(|t| t.window_id == window_id && t.index >= index)
        {
            tab.index += 1;
        }

        let mut tab = TabInfo::new(state.next_tab_id, window_id, props.url).with_index(index);
        tab.active = props.active;
        state.insert_tab(tab.clone());
        Ok(tab)
    }

    async fn activate_tab(&self, tab_id: TabId) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::ActivateTab, Some(tab_id), None)?;
        state.activate(tab_id)
    }

    async fn remove_tab(&self, tab_id: TabId) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::RemoveTab, Some(tab_id), None)?;
        state
            .drop_tab(tab_id)
            .map(|_| ())
            .ok_or(HostError::NoSuchTab(tab_id))
    }

    async fn send_to_tab(&self, tab_id: TabId, command: PageCommand) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::SendToTab, Some(tab_id), Some(&command))?;
        state.tab(tab_id)?;
        if !state.listeners.contains(&tab_id) {
            return Err(HostError::NoReceiver);
        }
        state.delivered.push((tab_id, command));
        Ok(())
    }
}

#[async_trait]
impl WindowsHost for SimulatedBrowser {
    async fn get_window(&self, window_id: WindowId) -> HostResult<WindowInfo> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::GetWindow, None, None)?;
        state.window(window_id).cloned()
    }

    async fn list_normal_windows(&self) -> HostResult<Vec<WindowInfo>> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::ListWindows, None, None)?;
        Ok(state
            .windows
            .values()
            .filter(|w| w.is_normal())
            .cloned()
            .collect())
    }

    async fn focus_window(&self, window_id: WindowId) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::FocusWindow, None, None)?;
        state.window(window_id)?;
        state.focus(Some(window_id));
        Ok(())
    }
}

#[async_trait]
impl ScriptingHost for SimulatedBrowser {
    async fn inject_scripts(&self, tab_id: TabId, files: &[String]) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::InjectScripts, Some(tab_id), None)?;
        let url = state.tab(tab_id)?.url.clone();
        if is_internal(url.as_deref()) {
            return Err(HostError::runtime(format!(
                "Cannot access contents of url \"{}\"",
                url.unwrap_or_default()
            )));
        }
        debug!(tab_id, scripts = files.len(), "scripts injected");
        state.listeners.insert(tab_id);
        Ok(())
    }
}

#[async_trait]
impl StorageHost for SimulatedBrowser {
    async fn storage_get(&self, key: &str) -> HostResult<Option<Value>> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::StorageGet, None, None)?;
        Ok(state.storage.get(key).cloned())
    }

    async fn storage_set(&self, key: &str, value: Value) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::StorageSet, None, None)?;
        state.storage.insert(key.to_string(), value);
        Ok(())
    }

    async fn storage_remove(&self, key: &str) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::StorageRemove, None, None)?;
        state.storage.remove(key);
        Ok(())
    }
}

#[async_trait]
impl ActionHost for SimulatedBrowser {
    async fn set_badge(&self, tab_id: TabId, enabled: bool) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::SetBadge, Some(tab_id), None)?;
        state.tab(tab_id)?;
        state.badges.insert(tab_id, enabled);
        Ok(())
    }
}

#[async_trait]
impl DockedPanelHost for SimulatedBrowser {
    async fn set_panel_options(&self, tab_id: TabId, path: &str, enabled: bool) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::SetPanelOptions, Some(tab_id), None)?;
        state.tab(tab_id)?;
        let binding = state.panels.entry(tab_id).or_default();
        binding.path = path.to_string();
        binding.enabled = enabled;
        if !enabled {
            binding.shown = false;
        }
        Ok(())
    }

    async fn open_panel(&self, tab_id: TabId, window_id: WindowId) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::OpenPanel, Some(tab_id), None)?;
        state.window(window_id)?;
        state.tab(tab_id)?;
        match state.panels.get_mut(&tab_id) {
            Some(binding) if binding.enabled => {
                binding.shown = true;
                Ok(())
            }
            _ => Err(HostError::runtime(format!(
                "No active side panel for tabId: {}",
                tab_id
            ))),
        }
    }
}

#[async_trait]
impl SplitViewHost for SimulatedBrowser {
    async fn split_view(&self, anchor: &TabInfo, companion: &TabInfo) -> HostResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.begin(Operation::SplitView, Some(anchor.id), None)?;
        state.tab(anchor.id)?;
        state.tab(companion.id)?;
        state.splits.push((anchor.id, companion.id));
        Ok(())
    }
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
