//! Companion panel lifecycle.
//!
//! Open-or-focus runs `guard check -> docked panel -> companion tab`, with a
//! single delayed retry for recoverable host refusals at each call. Calls for
//! the same anchor collapse onto whichever attempt is already in flight.
//! Panel attachment is a UX nicety, so nothing here returns an error: the
//! caller gets a [`PanelOutcome`] and diagnostics go to the log.

use std::collections::HashMap;
use std::sync::Arc;

use heymic_core::{ClassifiedError, EventBus, RestrictedSurfaceGuard, TabPatch, TabStateRegistry};
use heymic_protocols::host::{DockedPanelHost, HostEnvironment};
use heymic_protocols::message::BroadcastEvent;
use heymic_protocols::types::{CreateTabProps, PanelOutcome, TabId, TabInfo};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::host_call::{best_effort, RetryPolicy};

/// Which surface an attempt is trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelStrategy {
    Docked,
    CompanionTab,
}

/// Bookkeeping for one open-or-focus call. Never outlives the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelOpenAttempt {
    pub anchor_tab_id: TabId,
    pub strategy: PanelStrategy,
    pub attempt_count: u32,
    pub last_error: Option<String>,
}

impl PanelOpenAttempt {
    fn new(anchor_tab_id: TabId) -> Self {
        Self {
            anchor_tab_id,
            strategy: PanelStrategy::Docked,
            attempt_count: 0,
            last_error: None,
        }
    }

    fn failed(&mut self, error: &ClassifiedError) {
        self.last_error = Some(error.to_string());
    }
}

/// Settings for [`PanelLifecycleController`].
#[derive(Debug, Clone)]
pub struct PanelSettings {
    pub page_path: String,
    pub split_view: bool,
    pub retry: RetryPolicy,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            page_path: "user_popup.html".to_string(),
            split_view: true,
            retry: RetryPolicy::default(),
        }
    }
}

type InFlightMap = Mutex<HashMap<TabId, watch::Receiver<Option<PanelOutcome>>>>;

enum Role {
    Leader(watch::Sender<Option<PanelOutcome>>),
    Follower(watch::Receiver<Option<PanelOutcome>>),
}

/// Removes the in-flight entry when the leading attempt finishes or is dropped.
struct InFlightGuard<'a> {
    map: &'a InFlightMap,
    anchor: TabId,
    tx: &'a watch::Sender<Option<PanelOutcome>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock();
        if map
            .get(&self.anchor)
            .is_some_and(|rx| rx.same_channel(&self.tx.subscribe()))
        {
            map.remove(&self.anchor);
        }
    }
}

pub struct PanelLifecycleController {
    registry: Arc<TabStateRegistry>,
    guard: Arc<RestrictedSurfaceGuard>,
    host: HostEnvironment,
    events: EventBus,
    settings: PanelSettings,
    in_flight: InFlightMap,
    /// anchor -> companion tab
    companions: Mutex<HashMap<TabId, TabId>>,
}

impl PanelLifecycleController {
    pub fn new(
        registry: Arc<TabStateRegistry>,
        guard: Arc<RestrictedSurfaceGuard>,
        host: HostEnvironment,
        events: EventBus,
        settings: PanelSettings,
    ) -> Self {
        Self {
            registry,
            guard,
            host,
            events,
            settings,
            in_flight: Mutex::new(HashMap::new()),
            companions: Mutex::new(HashMap::new()),
        }
    }

    /// Open or focus the companion panel for `anchor`.
    pub async fn open_or_focus(&self, anchor: TabId) -> PanelOutcome {
        loop {
            match self.join(anchor) {
                Role::Leader(tx) => {
                    let _guard = InFlightGuard {
                        map: &self.in_flight,
                        anchor,
                        tx: &tx,
                    };
                    let outcome = self.attempt(anchor).await;
                    tx.send_replace(Some(outcome.clone()));
                    return outcome;
                }
                Role::Follower(mut rx) => {
                    debug!(anchor, "panel open already in flight, waiting");
                    if let Ok(outcome) = rx.wait_for(Option::is_some).await {
                        if let Some(outcome) = outcome.as_ref() {
                            return outcome.clone();
                        }
                    }
                    // Leader dropped without an outcome; try again ourselves.
                }
            }
        }
    }

    fn join(&self, anchor: TabId) -> Role {
        let mut map = self.in_flight.lock();
        if let Some(rx) = map.get(&anchor) {
            return Role::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        map.insert(anchor, rx);
        Role::Leader(tx)
    }

    pub fn is_in_flight(&self, anchor: TabId) -> bool {
        self.in_flight.lock().contains_key(&anchor)
    }

    async fn attempt(&self, anchor: TabId) -> PanelOutcome {
        let tab = match self.host.tabs.get_tab(anchor).await {
            Ok(tab) => tab,
            Err(e) => return self.give_up(anchor, format!("anchor unavailable: {}", e)),
        };

        if self.guard.is_restricted_tab(&tab) {
            warn!(anchor, url = ?tab.best_known_url(), "companion panel refused on restricted page");
            self.mark_closed(anchor);
            return PanelOutcome::Restricted;
        }
        if self.registry.ensure(anchor, tab.best_known_url()).is_none() {
            return self.give_up(anchor, "anchor tab was closed".to_string());
        }

        let mut attempt = PanelOpenAttempt::new(anchor);

        if let Some(docked) = self.host.docked_panel.clone() {
            if self.open_docked(docked.as_ref(), &tab, &mut attempt).await {
                return self.settle(anchor, PanelOutcome::Docked).await;
            }
            debug!(anchor, error = ?attempt.last_error, "docked panel unavailable, falling back");
        }

        attempt.strategy = PanelStrategy::CompanionTab;
        match self.open_companion(&tab, &mut attempt).await {
            Some(outcome) => self.settle(anchor, outcome).await,
            None => {
                let reason = attempt
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "companion tab unavailable".to_string());
                self.give_up(anchor, reason)
            }
        }
    }

    async fn open_docked(
        &self,
        docked: &dyn DockedPanelHost,
        tab: &TabInfo,
        attempt: &mut PanelOpenAttempt,
    ) -> bool {
        let retry = &self.settings.retry;
        let path = self.settings.page_path.as_str();

        let bound = retry
            .run("sidePanel.setOptions", &mut attempt.attempt_count, || {
                docked.set_panel_options(tab.id, path, true)
            })
            .await;
        if let Err(e) = bound {
            if !e.is_ignorable() {
                attempt.failed(&e);
                return false;
            }
        }

        let shown = retry
            .run("sidePanel.open", &mut attempt.attempt_count, || {
                docked.open_panel(tab.id, tab.window_id)
            })
            .await;
        match shown {
            Ok(()) => true,
            Err(e) if e.is_ignorable() => true,
            Err(e) => {
                attempt.failed(&e);
                false
            }
        }
    }

    async fn open_companion(
        &self,
        anchor: &TabInfo,
        attempt: &mut PanelOpenAttempt,
    ) -> Option<PanelOutcome> {
        if let Some(outcome) = self.refocus_companion(anchor, attempt).await {
            return Some(outcome);
        }

        let url = format!("{}?tabId={}", self.settings.page_path, anchor.id);
        let created = self
            .settings
            .retry
            .run("tabs.create", &mut attempt.attempt_count, || {
                self.host
                    .tabs
                    .create_tab(CreateTabProps::new(url.clone()).adjacent_to(anchor))
            })
            .await;
        let companion = match created {
            Ok(tab) => tab,
            Err(e) => {
                attempt.failed(&e);
                return None;
            }
        };

        if !self.registry.contains(anchor.id) {
            debug!(anchor = anchor.id, companion = companion.id, "anchor closed mid-open, discarding companion");
            best_effort("tabs.remove", self.host.tabs.remove_tab(companion.id)).await;
            attempt.last_error = Some("anchor tab was closed".to_string());
            return None;
        }
        self.companions.lock().insert(anchor.id, companion.id);
        info!(anchor = anchor.id, companion = companion.id, "companion tab opened");

        self.bridge(anchor, &companion).await;
        Some(PanelOutcome::CompanionTab {
            tab_id: companion.id,
            reused: false,
        })
    }

    /// Reuse a live companion for this anchor. A stale pairing is dropped.
    async fn refocus_companion(
        &self,
        anchor: &TabInfo,
        attempt: &mut PanelOpenAttempt,
    ) -> Option<PanelOutcome> {
        let companion_id = self.companion_of(anchor.id)?;
        let companion = match self.host.tabs.get_tab(companion_id).await {
            Ok(tab) => tab,
            Err(e) => {
                debug!(anchor = anchor.id, companion_id, error = %e, "companion tab gone");
                self.unpair(anchor.id, companion_id);
                return None;
            }
        };

        let focused = self
            .settings
            .retry
            .run("tabs.update", &mut attempt.attempt_count, || {
                self.host.tabs.activate_tab(companion.id)
            })
            .await;
        if let Err(e) = focused {
            if !e.is_ignorable() {
                attempt.failed(&e);
                return None;
            }
        }

        debug!(anchor = anchor.id, companion_id, "companion tab reused");
        self.bridge(anchor, &companion).await;
        Some(PanelOutcome::CompanionTab {
            tab_id: companion.id,
            reused: true,
        })
    }

    /// Window focus and split view. Both are optional niceties.
    async fn bridge(&self, anchor: &TabInfo, companion: &TabInfo) {
        best_effort(
            "windows.update",
            self.host.windows.focus_window(companion.window_id),
        )
        .await;
        if !self.settings.split_view {
            return;
        }
        if let Some(split) = &self.host.split_view {
            best_effort("splitView", split.split_view(anchor, companion)).await;
        }
    }

    /// Look at the anchor again before flagging the panel open. It may have
    /// closed or moved onto a restricted page while the host calls ran.
    async fn settle(&self, anchor: TabId, outcome: PanelOutcome) -> PanelOutcome {
        let tab = match self.host.tabs.get_tab(anchor).await {
            Ok(tab) => tab,
            Err(e) => return self.give_up(anchor, format!("anchor unavailable: {}", e)),
        };
        if self.guard.is_restricted_tab(&tab) {
            warn!(anchor, url = ?tab.best_known_url(), "anchor turned restricted mid-open");
            if let PanelOutcome::CompanionTab {
                tab_id: companion,
                reused: false,
            } = outcome
            {
                self.unpair(anchor, companion);
                best_effort("tabs.remove", self.host.tabs.remove_tab(companion)).await;
            }
            self.detach_restricted(anchor).await;
            return PanelOutcome::Restricted;
        }
        self.mark_open(anchor, outcome)
    }

    fn mark_open(&self, anchor: TabId, outcome: PanelOutcome) -> PanelOutcome {
        match self.registry.update(anchor, TabPatch::new().panel_open(true)) {
            Some(_) => {
                debug!(anchor, ?outcome, "companion panel open");
                self.events.publish(BroadcastEvent::PanelStateChanged {
                    tab_id: anchor,
                    open: true,
                });
            }
            None => debug!(anchor, "anchor closed before panel bookkeeping"),
        }
        outcome
    }

    fn mark_closed(&self, anchor: TabId) {
        let was_open = self.registry.get(anchor).is_some_and(|r| r.panel_open);
        self.registry.update(anchor, TabPatch::new().panel_open(false));
        if was_open {
            self.events.publish(BroadcastEvent::PanelStateChanged {
                tab_id: anchor,
                open: false,
            });
        }
    }

    fn give_up(&self, anchor: TabId, reason: String) -> PanelOutcome {
        warn!(anchor, %reason, "giving up on companion panel");
        PanelOutcome::GaveUp { reason }
    }

    /// The anchor moved onto a restricted page: unbind the docked panel and
    /// clear the open flag.
    pub async fn detach_restricted(&self, anchor: TabId) {
        self.mark_closed(anchor);
        if let Some(docked) = &self.host.docked_panel {
            best_effort(
                "sidePanel.setOptions",
                docked.set_panel_options(anchor, &self.settings.page_path, false),
            )
            .await;
        }
    }

    /// Drop every bit of panel bookkeeping involving a closed tab.
    ///
    /// Closing a companion clears its anchor's open flag.
    pub fn forget(&self, tab_id: TabId) {
        self.in_flight.lock().remove(&tab_id);
        let orphaned: Vec<TabId> = {
            let mut companions = self.companions.lock();
            companions.remove(&tab_id);
            let anchors: Vec<TabId> = companions
                .iter()
                .filter(|(_, companion)| **companion == tab_id)
                .map(|(anchor, _)| *anchor)
                .collect();
            for anchor in &anchors {
                companions.remove(anchor);
            }
            anchors
        };
        for anchor in orphaned {
            debug!(anchor, companion = tab_id, "companion tab closed");
            self.mark_closed(anchor);
        }
    }

    pub fn companion_of(&self, anchor: TabId) -> Option<TabId> {
        self.companions.lock().get(&anchor).copied()
    }

    pub fn anchor_of(&self, companion: TabId) -> Option<TabId> {
        self.companions
            .lock()
            .iter()
            .find(|(_, c)| **c == companion)
            .map(|(anchor, _)| *anchor)
    }

    pub fn is_companion(&self, tab_id: TabId) -> bool {
        self.companions.lock().values().any(|c| *c == tab_id)
    }

    fn unpair(&self, anchor: TabId, companion: TabId) {
        let mut companions = self.companions.lock();
        if companions.get(&anchor) == Some(&companion) {
            companions.remove(&anchor);
        }
    }
}

#[cfg(test)]
#[path = "panel_tests.rs"]
mod tests;
