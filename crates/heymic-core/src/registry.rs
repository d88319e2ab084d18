//! Per-tab live state.
//!
//! Host events arrive in no guaranteed order, so a lookup that finds nothing
//! is a normal outcome: the tab may already have been removed. Removed ids
//! are remembered so that a stale update delivered after removal cannot
//! bring a record back.

use std::collections::{HashSet, VecDeque};

use dashmap::DashMap;
use heymic_protocols::types::TabId;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

const TOMBSTONE_CAPACITY: usize = 1024;

/// Live state of one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub tab_id: TabId,
    pub mic_enabled: bool,
    pub dom_effects_enabled: bool,
    pub panel_open: bool,
    pub current_url: Option<String>,
}

impl TabRecord {
    pub fn new(tab_id: TabId, current_url: Option<&str>) -> Self {
        Self {
            tab_id,
            mic_enabled: false,
            dom_effects_enabled: false,
            panel_open: false,
            current_url: current_url.map(str::to_string),
        }
    }
}

/// Partial update for a [`TabRecord`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabPatch {
    pub mic_enabled: Option<bool>,
    pub dom_effects_enabled: Option<bool>,
    pub panel_open: Option<bool>,
    pub current_url: Option<Option<String>>,
}

impl TabPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mic(mut self, enabled: bool) -> Self {
        self.mic_enabled = Some(enabled);
        self
    }

    pub fn dom_effects(mut self, enabled: bool) -> Self {
        self.dom_effects_enabled = Some(enabled);
        self
    }

    pub fn panel_open(mut self, open: bool) -> Self {
        self.panel_open = Some(open);
        self
    }

    pub fn url(mut self, url: Option<&str>) -> Self {
        self.current_url = Some(url.map(str::to_string));
        self
    }

    fn apply(self, record: &mut TabRecord) {
        if let Some(v) = self.mic_enabled {
            record.mic_enabled = v;
        }
        if let Some(v) = self.dom_effects_enabled {
            record.dom_effects_enabled = v;
        }
        if let Some(v) = self.panel_open {
            record.panel_open = v;
        }
        if let Some(v) = self.current_url {
            record.current_url = v;
        }
    }
}

#[derive(Default)]
struct Tombstones {
    order: VecDeque<TabId>,
    ids: HashSet<TabId>,
}

impl Tombstones {
    fn bury(&mut self, tab_id: TabId) {
        if !self.ids.insert(tab_id) {
            return;
        }
        self.order.push_back(tab_id);
        while self.order.len() > TOMBSTONE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }
}

/// Process-wide mapping from tab identity to its live state.
///
/// Owned by the controller; tests build isolated instances.
pub struct TabStateRegistry {
    records: DashMap<TabId, TabRecord>,
    tombstones: Mutex<Tombstones>,
}

impl TabStateRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            tombstones: Mutex::new(Tombstones::default()),
        }
    }

    pub fn get(&self, tab_id: TabId) -> Option<TabRecord> {
        self.records.get(&tab_id).map(|r| r.clone())
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.records.contains_key(&tab_id)
    }

    /// Create the record if absent and return it.
    ///
    /// An existing record keeps its state; a missing address is filled in
    /// from `initial_url`. Returns `None` for a tab that was already removed.
    pub fn ensure(&self, tab_id: TabId, initial_url: Option<&str>) -> Option<TabRecord> {
        let tombstones = self.tombstones.lock();
        if tombstones.ids.contains(&tab_id) {
            debug!(tab_id, "ignoring reference to removed tab");
            return None;
        }
        let mut entry = self.records.entry(tab_id).or_insert_with(|| {
            debug!(tab_id, "tab record created");
            TabRecord::new(tab_id, initial_url)
        });
        if entry.current_url.is_none() {
            entry.current_url = initial_url.map(str::to_string);
        }
        Some(entry.clone())
    }

    /// Apply a patch to an existing record. Absent records are left absent.
    pub fn update(&self, tab_id: TabId, patch: TabPatch) -> Option<TabRecord> {
        let mut record = self.records.get_mut(&tab_id)?;
        patch.apply(&mut record);
        Some(record.clone())
    }

    /// Drop a record. Removing an unknown or already-removed tab is a no-op.
    pub fn remove(&self, tab_id: TabId) -> Option<TabRecord> {
        let mut tombstones = self.tombstones.lock();
        tombstones.bury(tab_id);
        let removed = self.records.remove(&tab_id).map(|(_, record)| record);
        if removed.is_some() {
            debug!(tab_id, "tab record removed");
        }
        removed
    }

    pub fn is_removed(&self, tab_id: TabId) -> bool {
        self.tombstones.lock().ids.contains(&tab_id)
    }

    /// The tab holding the mic, if any.
    pub fn find_enabled_mic_tab(&self) -> Option<TabId> {
        self.records
            .iter()
            .find(|r| r.mic_enabled)
            .map(|r| r.tab_id)
    }

    /// Every tab currently flagged as holding the mic, sorted.
    pub fn enabled_mic_tabs(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self
            .records
            .iter()
            .filter(|r| r.mic_enabled)
            .map(|r| r.tab_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.records.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for TabStateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
