//! Single-tab mic enablement.
//!
//! At most one tab holds the mic. Every enable sweeps all other enabled tabs
//! before flipping the target flag, and the flip happens synchronously right
//! after the final sweep check, with no suspension point in between.
//! Enable and disable calls are serialized so a sweep always completes
//! before the next one starts.

use std::sync::Arc;

use heymic_core::{EventBus, RestrictedSurfaceGuard, TabPatch, TabRecord, TabStateRegistry};
use heymic_protocols::host::TabsHost;
use heymic_protocols::message::{BroadcastEvent, PageCommand};
use heymic_protocols::types::{TabId, TabInfo};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::listener::PageBridge;

pub struct MicEnablementCoordinator {
    registry: Arc<TabStateRegistry>,
    guard: Arc<RestrictedSurfaceGuard>,
    tabs: Arc<dyn TabsHost>,
    page: PageBridge,
    events: EventBus,
    gate: Mutex<()>,
}

impl MicEnablementCoordinator {
    pub fn new(
        registry: Arc<TabStateRegistry>,
        guard: Arc<RestrictedSurfaceGuard>,
        tabs: Arc<dyn TabsHost>,
        page: PageBridge,
        events: EventBus,
    ) -> Self {
        Self {
            registry,
            guard,
            tabs,
            page,
            events,
            gate: Mutex::new(()),
        }
    }

    /// Exclusive acquire for `tab_id`. Returns whether the tab now holds the mic.
    ///
    /// Restricted, unknown and already-closed tabs are refused without any
    /// state change.
    pub async fn enable(&self, tab_id: TabId) -> bool {
        let _gate = self.gate.lock().await;
        self.enable_locked(tab_id).await
    }

    /// Clear the flag, stop the page listener and broadcast. Unknown tabs are a no-op.
    pub async fn disable(&self, tab_id: TabId) -> bool {
        let _gate = self.gate.lock().await;
        self.disable_locked(tab_id).await;
        true
    }

    /// Flip the tab's mic. Returns the new state.
    pub async fn toggle(&self, tab_id: TabId) -> bool {
        let _gate = self.gate.lock().await;
        if self.is_enabled(tab_id) {
            self.disable_locked(tab_id).await;
            false
        } else {
            self.enable_locked(tab_id).await
        }
    }

    async fn enable_locked(&self, tab_id: TabId) -> bool {
        let tab = match self.tabs.get_tab(tab_id).await {
            Ok(tab) => tab,
            Err(e) => {
                debug!(tab_id, error = %e, "cannot enable mic for unknown tab");
                return false;
            }
        };
        if self.guard.is_restricted_tab(&tab) {
            info!(tab_id, "mic refused on restricted page");
            return false;
        }
        if self.registry.ensure(tab_id, tab.best_known_url()).is_none() {
            return false;
        }
        if !self.acquire(tab_id).await {
            return false;
        }
        self.page.badge(tab_id, true).await;

        // The tab may have navigated while the sweep and badge calls ran.
        match self.tabs.get_tab(tab_id).await {
            Ok(tab) if !self.guard.is_restricted_tab(&tab) => {}
            _ => {
                info!(tab_id, "tab left before injection, mic released");
                self.release(tab_id, false).await;
                return false;
            }
        }

        self.page.inject(tab_id).await;
        if self.is_enabled(tab_id) {
            self.page.signal(tab_id, PageCommand::Activate).await;
        }
        true
    }

    async fn disable_locked(&self, tab_id: TabId) {
        if self.registry.contains(tab_id) {
            self.release(tab_id, true).await;
        }
    }

    /// The page reports it started listening: take the mic without re-injecting.
    pub async fn acknowledge_enabled(&self, tab_id: TabId) -> bool {
        let _gate = self.gate.lock().await;
        if self.registry.ensure(tab_id, None).is_none() {
            return false;
        }
        if !self.acquire(tab_id).await {
            return false;
        }
        self.page.badge(tab_id, true).await;
        true
    }

    /// The page reports it stopped listening.
    pub async fn acknowledge_disabled(&self, tab_id: TabId) {
        let _gate = self.gate.lock().await;
        if self.is_enabled(tab_id) {
            self.release(tab_id, false).await;
        }
    }

    /// Stop every tab except `keep`, which ends up holding the mic if given.
    /// Returns how many tabs were stopped.
    pub async fn stop_all_except(&self, keep: Option<TabId>) -> usize {
        let _gate = self.gate.lock().await;
        let stopped = self.sweep(keep).await;
        if let Some(keep) = keep {
            if self.registry.ensure(keep, None).is_some() && self.acquire(keep).await {
                self.page.badge(keep, true).await;
            }
        }
        stopped
    }

    /// Stop every tab. Returns how many tabs were stopped.
    pub async fn disable_all(&self) -> usize {
        let _gate = self.gate.lock().await;
        self.sweep(None).await
    }

    /// Drop the mic for a tab that navigated onto a restricted page. No stop
    /// signal is sent since nothing can listen there.
    pub async fn release_restricted(&self, tab_id: TabId) {
        let _gate = self.gate.lock().await;
        if self.is_enabled(tab_id) {
            info!(tab_id, "mic released, tab became restricted");
            self.release(tab_id, false).await;
        }
    }

    /// Bring the page listener back in line after activation or a finished load.
    pub async fn resume(&self, tab: &TabInfo, reinject: bool) {
        let enabled = self.is_enabled(tab.id);
        self.page.badge(tab.id, enabled).await;
        if !enabled || self.guard.is_restricted_tab(tab) {
            return;
        }
        if reinject {
            self.page.inject(tab.id).await;
        }
        if self.is_enabled(tab.id) {
            self.page.signal(tab.id, PageCommand::Activate).await;
        }
    }

    /// A record was torn down; announce the mic going away with it.
    pub fn tab_closed(&self, record: &TabRecord) {
        if record.mic_enabled {
            self.events.publish(BroadcastEvent::mic(record.tab_id, false));
        }
    }

    pub fn is_enabled(&self, tab_id: TabId) -> bool {
        self.registry.get(tab_id).is_some_and(|r| r.mic_enabled)
    }

    async fn acquire(&self, tab_id: TabId) -> bool {
        loop {
            if self.sweep(Some(tab_id)).await == 0 {
                break;
            }
        }
        if self.registry.update(tab_id, TabPatch::new().mic(true)).is_none() {
            debug!(tab_id, "tab closed before mic could be enabled");
            return false;
        }
        debug!(tab_id, "mic enabled");
        self.events.publish(BroadcastEvent::mic(tab_id, true));
        true
    }

    async fn sweep(&self, except: Option<TabId>) -> usize {
        let others: Vec<TabId> = self
            .registry
            .enabled_mic_tabs()
            .into_iter()
            .filter(|id| Some(*id) != except)
            .collect();
        for &other in &others {
            self.release(other, true).await;
        }
        others.len()
    }

    async fn release(&self, tab_id: TabId, signal_stop: bool) {
        if self.registry.update(tab_id, TabPatch::new().mic(false)).is_none() {
            return;
        }
        debug!(tab_id, "mic disabled");
        self.events.publish(BroadcastEvent::mic(tab_id, false));
        self.page.badge(tab_id, false).await;
        if signal_stop {
            self.page.signal(tab_id, PageCommand::Stop).await;
        }
    }
}

#[cfg(test)]
#[path = "mic_tests.rs"]
mod tests;
