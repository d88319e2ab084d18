//! The coordinating controller.
//!
//! Owns every piece of shared state (tab registry, sessions, panel
//! bookkeeping) and funnels host events, UI requests and page events into
//! the components that act on them. Host events carry no ordering
//! guarantee, so every handler re-reads the registry after each await and
//! treats a missing record as "nothing to do".

use std::sync::Arc;

use heymic_config::Config;
use heymic_core::{EventBus, RestrictedSurfaceGuard, TabPatch, TabStateRegistry};
use heymic_protocols::error::{ControllerError, HostError};
use heymic_protocols::host::HostEnvironment;
use heymic_protocols::message::{
    BroadcastEvent, HostEvent, MicReport, PageCommand, PageEvent, Request, Response,
    SystemNotice, TOGGLE_MIC_COMMAND,
};
use heymic_protocols::types::{
    CreateTabProps, LogEntry, LogRole, TabChange, TabId, TabInfo, TabQuery, TabStatus, WindowId,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::conversation::ConversationStore;
use crate::focus::FocusTracker;
use crate::host_call::{best_effort, RetryPolicy};
use crate::listener::PageBridge;
use crate::mic::MicEnablementCoordinator;
use crate::panel::{PanelLifecycleController, PanelSettings};
use crate::session::SessionManager;
use crate::settings::SettingsStore;

const MIC_ENABLED_NOTE: &str = "Mic enabled";
const MIC_STOPPED_NOTE: &str = "Mic was stopped";

pub struct Controller {
    host: HostEnvironment,
    events: EventBus,
    registry: Arc<TabStateRegistry>,
    guard: Arc<RestrictedSurfaceGuard>,
    sessions: SessionManager,
    mic: MicEnablementCoordinator,
    panel: PanelLifecycleController,
    page: PageBridge,
    settings: SettingsStore,
    focus: FocusTracker,
    context_window_tokens: u32,
}

impl Controller {
    pub fn new(host: HostEnvironment, config: &Config) -> Self {
        let events = EventBus::default();
        let registry = Arc::new(TabStateRegistry::new());
        let guard = Arc::new(
            RestrictedSurfaceGuard::new().with_extra_schemes(&config.guard.extra_restricted_schemes),
        );
        let page = PageBridge::new(
            host.tabs.clone(),
            host.scripting.clone(),
            host.action.clone(),
            config.mic.listener_scripts.clone(),
        );
        let sessions = SessionManager::new(
            ConversationStore::with_max_entries(config.conversation.max_entries),
            events.clone(),
        );
        let mic = MicEnablementCoordinator::new(
            registry.clone(),
            guard.clone(),
            host.tabs.clone(),
            page.clone(),
            events.clone(),
        );
        let panel = PanelLifecycleController::new(
            registry.clone(),
            guard.clone(),
            host.clone(),
            events.clone(),
            PanelSettings {
                page_path: config.panel.page_path.clone(),
                split_view: config.panel.split_view,
                retry: RetryPolicy::from(&config.panel),
            },
        );

        info!(
            docked_panel = host.docked_panel.is_some(),
            split_view = host.split_view.is_some(),
            restricted_schemes = guard.schemes().len(),
            "controller started"
        );

        Self {
            settings: SettingsStore::new(host.storage.clone()),
            focus: FocusTracker::new(),
            context_window_tokens: config.conversation.context_window_tokens,
            host,
            events,
            registry,
            guard,
            sessions,
            mic,
            panel,
            page,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &TabStateRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn mic(&self) -> &MicEnablementCoordinator {
        &self.mic
    }

    pub fn panel(&self) -> &PanelLifecycleController {
        &self.panel
    }

    pub fn guard(&self) -> &RestrictedSurfaceGuard {
        &self.guard
    }

    // ---- host events -------------------------------------------------------

    pub async fn handle_host_event(&self, event: HostEvent) {
        match event {
            HostEvent::TabCreated { tab } => self.on_created(&tab),
            HostEvent::TabActivated { tab_id, window_id } => {
                self.on_activated(tab_id, window_id).await
            }
            HostEvent::TabUpdated {
                tab_id,
                change,
                tab,
            } => self.on_updated(tab_id, change, tab).await,
            HostEvent::TabRemoved { tab_id } => self.teardown(tab_id),
            HostEvent::TabReplaced {
                added_tab_id,
                removed_tab_id,
            } => self.on_replaced(added_tab_id, removed_tab_id).await,
            HostEvent::WindowFocusChanged { window_id } => self.on_window_focus(window_id).await,
            HostEvent::WindowRemoved { window_id } => self.focus.forget(window_id),
            HostEvent::ActionClicked { tab } => {
                self.toggle_for_user(tab.id).await;
            }
            HostEvent::Command { name } => self.on_command(&name).await,
        }
    }

    fn on_created(&self, tab: &TabInfo) {
        let url = tab.best_known_url();
        if self.registry.ensure(tab.id, url).is_some() {
            self.sessions.get_or_create(tab.id, url);
        }
    }

    async fn on_activated(&self, tab_id: TabId, window_id: WindowId) {
        let tab = match self.host.tabs.get_tab(tab_id).await {
            Ok(tab) => tab,
            Err(e) => {
                debug!(tab_id, window_id, error = %e, "activated tab vanished");
                return;
            }
        };
        if self.registry.ensure(tab_id, tab.best_known_url()).is_none() {
            return;
        }
        self.mic.resume(&tab, false).await;
    }

    async fn on_updated(&self, tab_id: TabId, change: TabChange, tab: TabInfo) {
        if self.registry.is_removed(tab_id) {
            debug!(tab_id, "update for closed tab ignored");
            return;
        }
        if change.status.is_none() && change.url.is_none() {
            return;
        }

        let url = change.url.as_deref().or(tab.best_known_url());
        if self.registry.ensure(tab_id, url).is_none() {
            return;
        }
        self.registry.update(tab_id, TabPatch::new().url(url));

        if change.status == Some(TabStatus::Loading) {
            self.sessions.reset(tab_id, url);
        } else if self.sessions.refresh_url(tab_id, url).is_none() {
            self.sessions.get_or_create(tab_id, url);
        }

        if self.guard.is_restricted_tab(&tab) {
            self.on_restricted(tab_id).await;
        } else if change.status == Some(TabStatus::Complete) {
            self.mic.resume(&tab, true).await;
        }
    }

    async fn on_restricted(&self, tab_id: TabId) {
        let panel_open = self.registry.get(tab_id).is_some_and(|r| r.panel_open);
        if panel_open || self.panel.is_in_flight(tab_id) {
            self.panel.detach_restricted(tab_id).await;
        }
        self.mic.release_restricted(tab_id).await;
    }

    /// Unconditional teardown of everything keyed to a closed tab. Idempotent.
    fn teardown(&self, tab_id: TabId) {
        let record = self.registry.remove(tab_id);
        self.sessions.discard(tab_id);
        self.panel.forget(tab_id);
        if let Some(record) = record {
            debug!(tab_id, "tab torn down");
            self.mic.tab_closed(&record);
        }
    }

    /// The host swapped one tab instance for another. The old identity's
    /// session and log go away; the new identity starts fresh.
    async fn on_replaced(&self, added: TabId, removed: TabId) {
        debug!(added, removed, "tab replaced");
        self.teardown(removed);

        let tab = self.host.tabs.get_tab(added).await.ok();
        let url = tab.as_ref().and_then(TabInfo::best_known_url);
        if self.registry.ensure(added, url).is_none() {
            return;
        }
        self.sessions.reset(added, url);
    }

    async fn on_window_focus(&self, window_id: Option<WindowId>) {
        let Some(window_id) = window_id else {
            return;
        };
        match self.host.windows.get_window(window_id).await {
            Ok(window) => self.focus.record(&window),
            Err(e) => debug!(window_id, error = %e, "focused window vanished"),
        }
    }

    async fn on_command(&self, name: &str) {
        if name != TOGGLE_MIC_COMMAND {
            debug!(name, "unknown command ignored");
            return;
        }
        match self.active_target_tab(None).await {
            Some(tab) => {
                self.toggle_for_user(tab.id).await;
            }
            None => debug!("toggle command without a target tab"),
        }
    }

    /// Toolbar or keyboard toggle. Turning the mic on also brings up the panel.
    async fn toggle_for_user(&self, tab_id: TabId) -> bool {
        let enabled = self.mic.toggle(tab_id).await;
        if enabled {
            self.panel.open_or_focus(tab_id).await;
        }
        enabled
    }

    /// Active tab of the target window. A focused companion tab stands in
    /// for its anchor.
    async fn active_target_tab(&self, window_id: Option<WindowId>) -> Option<TabInfo> {
        let window_id = self
            .focus
            .resolve(self.host.windows.as_ref(), window_id)
            .await?;
        let active = match self.host.tabs.query_tabs(TabQuery::active_in(window_id)).await {
            Ok(tabs) => tabs.into_iter().next()?,
            Err(e) => {
                debug!(window_id, error = %e, "active tab query failed");
                return None;
            }
        };
        match self.panel.anchor_of(active.id) {
            Some(anchor) => self.host.tabs.get_tab(anchor).await.ok(),
            None => Some(active),
        }
    }

    // ---- requests ----------------------------------------------------------

    /// Answer a request. Never fails: errors come back as `{ok: false, error}`.
    pub async fn handle_request(&self, request: Request, sender: Option<TabId>) -> Response {
        let name = request.name();
        debug!(request = name, ?sender, "request");
        match self.dispatch(request, sender).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request = name, error = %e, "request failed");
                Response::error(e.to_string())
            }
        }
    }

    async fn dispatch(
        &self,
        request: Request,
        sender: Option<TabId>,
    ) -> Result<Response, ControllerError> {
        let response = match request {
            Request::GetActiveTargetTab { window_id } => Response::Tab {
                tab: self
                    .active_target_tab(window_id)
                    .await
                    .map(|t| t.summary()),
            },
            Request::ListTabs { window_id } => {
                let tabs = match self.focus.resolve(self.host.windows.as_ref(), window_id).await {
                    Some(window_id) => {
                        self.host
                            .tabs
                            .query_tabs(TabQuery::in_window(window_id))
                            .await?
                    }
                    None => Vec::new(),
                };
                Response::Tabs {
                    tabs: tabs.iter().map(TabInfo::summary).collect(),
                }
            }
            Request::SwitchTab { tab_id } => {
                let tab = self.host.tabs.get_tab(tab_id).await.map_err(not_found)?;
                self.host.tabs.activate_tab(tab_id).await?;
                best_effort(
                    "windows.update",
                    self.host.windows.focus_window(tab.window_id),
                )
                .await;
                Response::ok()
            }
            Request::CloseTab { tab_id } => {
                self.host.tabs.remove_tab(tab_id).await.map_err(not_found)?;
                self.teardown(tab_id);
                Response::ok()
            }
            Request::OpenTab { url } => {
                if url.trim().is_empty() {
                    return Err(ControllerError::InvalidRequest("url is required".to_string()));
                }
                let mut props = CreateTabProps::new(url);
                props.window_id = self.focus.resolve(self.host.windows.as_ref(), None).await;
                let tab = self.host.tabs.create_tab(props).await?;
                self.on_created(&tab);
                Response::Opened { tab_id: tab.id }
            }
            Request::GetMicState { tab_id } => Response::MicState {
                enabled: self.mic.is_enabled(tab_id),
            },
            Request::GetMicEnabledTab => {
                let tab = match self.registry.find_enabled_mic_tab() {
                    Some(tab_id) => self.host.tabs.get_tab(tab_id).await.ok(),
                    None => None,
                };
                Response::Tab {
                    tab: tab.map(|t| t.summary()),
                }
            }
            Request::EnableMicForTab { tab_id } => Response::Ack {
                ok: self.mic.enable(tab_id).await,
            },
            Request::DisableMicForTab { tab_id } => Response::Ack {
                ok: self.mic.disable(tab_id).await,
            },
            Request::StopAllMics => {
                self.mic.stop_all_except(sender).await;
                Response::ok()
            }
            Request::DisableAll => {
                self.mic.disable_all().await;
                Response::ok()
            }
            Request::GetTabSession { tab_id } => {
                let url = self.live_url(tab_id).await?;
                let session = self.sessions.get_or_create(tab_id, url.as_deref());
                Response::Session {
                    session_id: session.session_id,
                    url: session.url,
                }
            }
            Request::ResetSession { tab_id } => {
                let url = self.live_url(tab_id).await?;
                self.sessions.reset(tab_id, url.as_deref());
                Response::ok()
            }
            Request::GetConversationLog { tab_id } => {
                let tab_id = tab_id.or(sender).ok_or_else(|| {
                    ControllerError::InvalidRequest("tabId is required".to_string())
                })?;
                Response::Log {
                    entries: self.sessions.log(tab_id),
                }
            }
            Request::GetContextLimits => Response::ContextLimits {
                window_tokens: self.context_window_tokens,
            },
            Request::OpenCompanionPanel { tab_id } => {
                let outcome = self.panel.open_or_focus(tab_id).await;
                Response::Panel {
                    ok: outcome.is_open(),
                    outcome,
                }
            }
            Request::GetDomEffects => Response::DomEffectsState {
                enabled: self.settings.dom_effects_enabled().await,
            },
            Request::SetDomEffects { tab_id, enabled } => {
                self.set_dom_effects(tab_id, enabled).await?
            }
            Request::GetDomLiftScale => Response::LiftScale {
                scale: self.settings.dom_lift_scale().await,
            },
            Request::SetDomLiftScale { scale } => {
                if !scale.is_finite() {
                    return Err(ControllerError::InvalidRequest(
                        "scale must be a finite number".to_string(),
                    ));
                }
                let scale = self.settings.set_dom_lift_scale(scale).await;
                if let Some(tab_id) = self.registry.find_enabled_mic_tab() {
                    self.page
                        .signal(tab_id, PageCommand::DomLiftAdjust { scale })
                        .await;
                }
                Response::LiftScale { scale }
            }
        };
        Ok(response)
    }

    /// Best-known address of a live tab, materializing its record on first reference.
    async fn live_url(&self, tab_id: TabId) -> Result<Option<String>, ControllerError> {
        if let Some(record) = self.registry.get(tab_id) {
            return Ok(record.current_url);
        }
        if self.registry.is_removed(tab_id) {
            return Err(ControllerError::TabNotFound(tab_id));
        }
        let tab = self.host.tabs.get_tab(tab_id).await.map_err(not_found)?;
        self.registry
            .ensure(tab_id, tab.best_known_url())
            .map(|record| record.current_url)
            .ok_or(ControllerError::TabNotFound(tab_id))
    }

    async fn set_dom_effects(
        &self,
        tab_id: Option<TabId>,
        enabled: bool,
    ) -> Result<Response, ControllerError> {
        let target = match tab_id.or_else(|| self.registry.find_enabled_mic_tab()) {
            Some(id) => id,
            None => {
                self.active_target_tab(None)
                    .await
                    .ok_or(ControllerError::NoTargetTab)?
                    .id
            }
        };
        let tab = self.host.tabs.get_tab(target).await.map_err(not_found)?;
        if self.registry.ensure(target, tab.best_known_url()).is_none() {
            return Err(ControllerError::TabNotFound(target));
        }
        self.registry
            .update(target, TabPatch::new().dom_effects(enabled));
        self.settings.set_dom_effects_enabled(enabled).await;

        let restricted = self.guard.is_restricted_tab(&tab);
        let mut injected = false;
        if !restricted {
            if enabled {
                injected = self.page.inject(target).await;
            }
            self.page
                .signal(target, PageCommand::DomEffects { enabled })
                .await;
        }

        self.events.publish(BroadcastEvent::DomEffectsChanged {
            tab_id: target,
            enabled,
        });
        Ok(Response::DomEffects {
            ok: true,
            enabled,
            tab_id: Some(target),
            injected,
            note: restricted.then(|| "restricted page, effects not injected".to_string()),
        })
    }

    // ---- page events -------------------------------------------------------

    /// Handle an event from the page-side listener running in `sender`.
    pub async fn handle_page_event(&self, event: PageEvent, sender: TabId) {
        if self.registry.is_removed(sender) {
            debug!(sender, "page event from closed tab ignored");
            return;
        }
        match event {
            PageEvent::Stt {
                text,
                tokens,
                chars,
            } => self.append_log(sender, LogEntry::new(LogRole::You, text, tokens, chars)),
            PageEvent::Llm {
                text,
                tokens,
                chars,
            } => self.append_log(
                sender,
                LogEntry::new(LogRole::Assistant, text, tokens, chars),
            ),
            PageEvent::System {
                notice: SystemNotice::Mic,
                state: MicReport::Enabled,
            } => {
                if self.mic.acknowledge_enabled(sender).await {
                    self.append_log(sender, LogEntry::new(LogRole::System, MIC_ENABLED_NOTE, None, None));
                }
            }
            PageEvent::System {
                notice: SystemNotice::Mic,
                state: MicReport::Disabled,
            } => {
                self.mic.acknowledge_disabled(sender).await;
                self.append_log(sender, LogEntry::new(LogRole::System, MIC_STOPPED_NOTE, None, None));
            }
        }
    }

    fn append_log(&self, tab_id: TabId, entry: LogEntry) {
        let Some(record) = self.registry.ensure(tab_id, None) else {
            return;
        };
        self.sessions
            .append(tab_id, record.current_url.as_deref(), entry);
    }
}

fn not_found(error: HostError) -> ControllerError {
    match error {
        HostError::NoSuchTab(id) => ControllerError::TabNotFound(id),
        other => ControllerError::Host(other),
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
