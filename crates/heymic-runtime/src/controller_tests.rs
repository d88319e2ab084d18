use super::*;
use heymic_host_simulated::{Operation, SimulatedBrowser};
use heymic_protocols::types::{PanelOutcome, WindowKind};
use serde_json::json;
use tokio::sync::broadcast::Receiver;

use crate::settings::{DOM_EFFECTS_KEY, DOM_LIFT_SCALE_KEY};

struct Fixture {
    browser: Arc<SimulatedBrowser>,
    controller: Controller,
    rx: Receiver<BroadcastEvent>,
}

impl Fixture {
    async fn host(&self, event: HostEvent) {
        self.browser.apply(&event);
        self.controller.handle_host_event(event).await;
    }

    async fn open(&self, url: &str) -> TabInfo {
        let tab = self.browser.add_tab(1, url);
        self.controller
            .handle_host_event(HostEvent::TabCreated { tab: tab.clone() })
            .await;
        tab
    }

    async fn request(&self, request: Request) -> Response {
        self.controller.handle_request(request, None).await
    }

    fn drain(&mut self) -> Vec<BroadcastEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.panel.retry_delay_ms = 5;
    config
}

fn fixture() -> Fixture {
    fixture_with(true)
}

fn fixture_with(docked: bool) -> Fixture {
    let browser = Arc::new(SimulatedBrowser::new());
    let env = if docked {
        browser.environment()
    } else {
        browser.environment_without_panel()
    };
    let controller = Controller::new(env, &config());
    let rx = controller.subscribe();
    Fixture {
        browser,
        controller,
        rx,
    }
}

#[tokio::test]
async fn test_tab_created_registers_record_and_session() {
    let f = fixture();
    let tab = f.open("https://example.com").await;

    let record = f.controller.registry().get(tab.id).unwrap();
    assert_eq!(record.current_url.as_deref(), Some("https://example.com"));
    assert!(!record.mic_enabled);
    assert!(f.controller.sessions().get(tab.id).is_some());
}

#[tokio::test]
async fn test_active_target_tab() {
    let f = fixture();
    f.open("https://one.example").await;
    let two = f.open("https://two.example").await;

    let response = f
        .request(Request::GetActiveTargetTab { window_id: None })
        .await;
    assert_eq!(
        response,
        Response::Tab {
            tab: Some(f.browser.tab(two.id).unwrap().summary())
        }
    );
}

#[tokio::test]
async fn test_active_companion_resolves_to_anchor() {
    let f = fixture_with(false);
    let anchor = f.open("https://example.com").await;

    let outcome = f.controller.panel().open_or_focus(anchor.id).await;
    let PanelOutcome::CompanionTab { tab_id, .. } = outcome else {
        panic!("expected companion tab, got {:?}", outcome);
    };
    assert!(f.browser.tab(tab_id).unwrap().active);

    let response = f
        .request(Request::GetActiveTargetTab { window_id: None })
        .await;
    let Response::Tab { tab: Some(summary) } = response else {
        panic!("expected a tab");
    };
    assert_eq!(summary.id, anchor.id);
}

#[tokio::test]
async fn test_list_tabs_in_window() {
    let f = fixture();
    f.open("https://one.example").await;
    f.open("https://two.example").await;
    let other = f.browser.add_window(WindowKind::Normal);
    f.browser.add_tab(other, "https://elsewhere.example");

    let Response::Tabs { tabs } = f.request(Request::ListTabs { window_id: None }).await else {
        panic!("expected tabs");
    };
    assert_eq!(tabs.len(), 2);
    assert!(tabs.iter().all(|t| t.window_id == 1));

    let Response::Tabs { tabs } = f
        .request(Request::ListTabs {
            window_id: Some(other),
        })
        .await
    else {
        panic!("expected tabs");
    };
    assert_eq!(tabs.len(), 1);
}

#[tokio::test]
async fn test_switch_tab() {
    let f = fixture();
    let one = f.open("https://one.example").await;
    f.open("https://two.example").await;

    assert_eq!(
        f.request(Request::SwitchTab { tab_id: one.id }).await,
        Response::ok()
    );
    assert!(f.browser.tab(one.id).unwrap().active);

    let missing = f.request(Request::SwitchTab { tab_id: 99 }).await;
    assert!(missing.is_error());
}

#[tokio::test]
async fn test_close_tab_tears_down() {
    let mut f = fixture();
    let tab = f.open("https://example.com").await;
    f.request(Request::EnableMicForTab { tab_id: tab.id }).await;
    f.drain();

    assert_eq!(
        f.request(Request::CloseTab { tab_id: tab.id }).await,
        Response::ok()
    );
    assert!(f.browser.tab(tab.id).is_none());
    assert!(f.controller.registry().get(tab.id).is_none());
    assert!(f.controller.sessions().get(tab.id).is_none());
    assert_eq!(f.drain(), vec![BroadcastEvent::mic(tab.id, false)]);

    // A late removal event for the same tab changes nothing.
    f.host(HostEvent::TabRemoved { tab_id: tab.id }).await;
    assert!(f.drain().is_empty());
}

#[tokio::test]
async fn test_open_tab() {
    let f = fixture();
    let response = f
        .request(Request::OpenTab {
            url: "https://new.example".to_string(),
        })
        .await;
    let Response::Opened { tab_id } = response else {
        panic!("expected opened, got {:?}", response);
    };
    assert_eq!(
        f.browser.tab(tab_id).unwrap().url.as_deref(),
        Some("https://new.example")
    );
    assert!(f.controller.registry().contains(tab_id));

    let blank = f
        .request(Request::OpenTab {
            url: "  ".to_string(),
        })
        .await;
    assert!(blank.is_error());
}

#[tokio::test]
async fn test_mic_requests() {
    let mut f = fixture();
    let tab = f.open("https://example.com").await;

    assert_eq!(
        f.request(Request::GetMicEnabledTab).await,
        Response::Tab { tab: None }
    );
    assert_eq!(
        f.request(Request::EnableMicForTab { tab_id: tab.id }).await,
        Response::ok()
    );
    assert_eq!(
        f.request(Request::GetMicState { tab_id: tab.id }).await,
        Response::MicState { enabled: true }
    );
    let Response::Tab { tab: Some(summary) } = f.request(Request::GetMicEnabledTab).await else {
        panic!("expected the enabled tab");
    };
    assert_eq!(summary.id, tab.id);
    assert_eq!(summary.url.as_deref(), Some("https://example.com"));
    assert_eq!(summary.window_id, tab.window_id);
    assert_eq!(f.browser.badge(tab.id), Some(true));

    assert_eq!(
        f.request(Request::DisableMicForTab { tab_id: tab.id }).await,
        Response::ok()
    );
    assert_eq!(
        f.drain(),
        vec![
            BroadcastEvent::mic(tab.id, true),
            BroadcastEvent::mic(tab.id, false)
        ]
    );
    assert_eq!(f.browser.badge(tab.id), Some(false));
}

#[tokio::test]
async fn test_enable_on_restricted_tab_is_refused() {
    let mut f = fixture();
    let tab = f.open("chrome://extensions").await;

    assert_eq!(
        f.request(Request::EnableMicForTab { tab_id: tab.id }).await,
        Response::not_ok()
    );
    assert!(!f.controller.mic().is_enabled(tab.id));
    assert_eq!(f.browser.count(Operation::InjectScripts), 0);
    assert!(f.drain().is_empty());
}

#[tokio::test]
async fn test_stop_all_mics_keeps_sender() {
    let mut f = fixture();
    let one = f.open("https://one.example").await;
    let two = f.open("https://two.example").await;
    f.request(Request::EnableMicForTab { tab_id: one.id }).await;
    f.drain();

    let response = f
        .controller
        .handle_request(Request::StopAllMics, Some(two.id))
        .await;
    assert_eq!(response, Response::ok());
    assert_eq!(
        f.drain(),
        vec![
            BroadcastEvent::mic(one.id, false),
            BroadcastEvent::mic(two.id, true)
        ]
    );
    assert_eq!(f.browser.delivered_to(two.id), Vec::<PageCommand>::new());

    assert_eq!(f.request(Request::DisableAll).await, Response::ok());
    assert_eq!(f.controller.registry().find_enabled_mic_tab(), None);
}

#[tokio::test]
async fn test_session_requests() {
    let mut f = fixture();
    let tab = f.open("https://example.com").await;

    let Response::Session { session_id, url } =
        f.request(Request::GetTabSession { tab_id: tab.id }).await
    else {
        panic!("expected session");
    };
    assert_eq!(url.as_deref(), Some("https://example.com"));

    let Response::Session {
        session_id: again, ..
    } = f.request(Request::GetTabSession { tab_id: tab.id }).await
    else {
        panic!("expected session");
    };
    assert_eq!(again, session_id);

    assert_eq!(
        f.request(Request::ResetSession { tab_id: tab.id }).await,
        Response::ok()
    );
    let events = f.drain();
    assert_eq!(events.len(), 1);
    let BroadcastEvent::TabSessionReset {
        previous_session_id,
        session_id: fresh,
        ..
    } = &events[0]
    else {
        panic!("expected session reset, got {:?}", events[0]);
    };
    assert_eq!(previous_session_id.as_deref(), Some(session_id.as_str()));
    assert_ne!(fresh, &session_id);
}

#[tokio::test]
async fn test_session_for_unknown_tab() {
    let f = fixture();
    let response = f.request(Request::GetTabSession { tab_id: 42 }).await;
    assert_eq!(
        response,
        Response::error(ControllerError::TabNotFound(42).to_string())
    );
}

#[tokio::test]
async fn test_session_for_host_tab_not_yet_seen() {
    let f = fixture();
    let tab = f.browser.add_tab(1, "https://quiet.example");

    let Response::Session { url, .. } = f.request(Request::GetTabSession { tab_id: tab.id }).await
    else {
        panic!("expected session");
    };
    assert_eq!(url.as_deref(), Some("https://quiet.example"));
    assert!(f.controller.registry().contains(tab.id));
}

#[tokio::test]
async fn test_conversation_log_defaults_to_sender() {
    let f = fixture();
    let tab = f.open("https://example.com").await;
    f.controller
        .handle_page_event(
            PageEvent::Stt {
                text: "hello there".to_string(),
                tokens: None,
                chars: None,
            },
            tab.id,
        )
        .await;

    let Response::Log { entries } = f
        .controller
        .handle_request(Request::GetConversationLog { tab_id: None }, Some(tab.id))
        .await
    else {
        panic!("expected log");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].role, LogRole::You);
    assert_eq!(entries[0].chars, 11);

    let missing = f.request(Request::GetConversationLog { tab_id: None }).await;
    assert!(missing.is_error());
}

#[tokio::test]
async fn test_context_limits() {
    let f = fixture();
    assert_eq!(
        f.request(Request::GetContextLimits).await,
        Response::ContextLimits {
            window_tokens: 4096
        }
    );
}

#[tokio::test]
async fn test_open_companion_panel_request() {
    let f = fixture();
    let tab = f.open("https://example.com").await;

    let response = f
        .request(Request::OpenCompanionPanel { tab_id: tab.id })
        .await;
    assert_eq!(
        response,
        Response::Panel {
            ok: true,
            outcome: PanelOutcome::Docked
        }
    );

    let restricted = f.open("chrome://settings").await;
    let response = f
        .request(Request::OpenCompanionPanel {
            tab_id: restricted.id,
        })
        .await;
    assert_eq!(
        response,
        Response::Panel {
            ok: false,
            outcome: PanelOutcome::Restricted
        }
    );
}

#[tokio::test]
async fn test_dom_effects_follow_mic_tab() {
    let mut f = fixture();
    f.open("https://one.example").await;
    let two = f.open("https://two.example").await;
    f.request(Request::EnableMicForTab { tab_id: two.id }).await;
    f.drain();

    let response = f
        .request(Request::SetDomEffects {
            tab_id: None,
            enabled: true,
        })
        .await;
    assert_eq!(
        response,
        Response::DomEffects {
            ok: true,
            enabled: true,
            tab_id: Some(two.id),
            injected: true,
            note: None,
        }
    );
    assert!(f.controller.registry().get(two.id).unwrap().dom_effects_enabled);
    assert_eq!(f.browser.stored(DOM_EFFECTS_KEY), Some(json!(true)));
    assert_eq!(
        f.drain(),
        vec![BroadcastEvent::DomEffectsChanged {
            tab_id: two.id,
            enabled: true
        }]
    );
    assert!(f
        .browser
        .delivered_to(two.id)
        .contains(&PageCommand::DomEffects { enabled: true }));
    assert_eq!(
        f.request(Request::GetDomEffects).await,
        Response::DomEffectsState { enabled: true }
    );
}

#[tokio::test]
async fn test_dom_effects_disable_does_not_inject() {
    let f = fixture();
    let tab = f.open("https://example.com").await;

    let Response::DomEffects { injected, .. } = f
        .request(Request::SetDomEffects {
            tab_id: Some(tab.id),
            enabled: false,
        })
        .await
    else {
        panic!("expected dom effects reply");
    };
    assert!(!injected);
    assert_eq!(f.browser.count(Operation::InjectScripts), 0);
    assert_eq!(
        f.request(Request::GetDomEffects).await,
        Response::DomEffectsState { enabled: false }
    );
}

#[tokio::test]
async fn test_dom_effects_on_restricted_tab() {
    let f = fixture();
    let tab = f.open("chrome://settings").await;

    let Response::DomEffects {
        ok,
        injected,
        note,
        ..
    } = f
        .request(Request::SetDomEffects {
            tab_id: Some(tab.id),
            enabled: true,
        })
        .await
    else {
        panic!("expected dom effects reply");
    };
    assert!(ok);
    assert!(!injected);
    assert!(note.is_some());
    assert_eq!(f.browser.count(Operation::InjectScripts), 0);
}

#[tokio::test]
async fn test_dom_effects_without_any_tab() {
    let f = fixture();
    let response = f
        .request(Request::SetDomEffects {
            tab_id: None,
            enabled: true,
        })
        .await;
    assert_eq!(
        response,
        Response::error(ControllerError::NoTargetTab.to_string())
    );
}

#[tokio::test]
async fn test_lift_scale_is_clamped_and_forwarded() {
    let f = fixture();
    let tab = f.open("https://example.com").await;
    f.request(Request::EnableMicForTab { tab_id: tab.id }).await;

    assert_eq!(
        f.request(Request::GetDomLiftScale).await,
        Response::LiftScale { scale: 1.15 }
    );
    assert_eq!(
        f.request(Request::SetDomLiftScale { scale: 9.0 }).await,
        Response::LiftScale { scale: 2.5 }
    );
    assert_eq!(f.browser.stored(DOM_LIFT_SCALE_KEY), Some(json!(2.5)));
    assert!(f
        .browser
        .delivered_to(tab.id)
        .contains(&PageCommand::DomLiftAdjust { scale: 2.5 }));

    let invalid = f
        .request(Request::SetDomLiftScale { scale: f64::NAN })
        .await;
    assert!(invalid.is_error());
}

#[tokio::test]
async fn test_page_mic_reports() {
    let mut f = fixture();
    let tab = f.open("https://example.com").await;

    let enabled = PageEvent::System {
        notice: SystemNotice::Mic,
        state: MicReport::Enabled,
    };
    f.controller.handle_page_event(enabled, tab.id).await;
    assert!(f.controller.mic().is_enabled(tab.id));
    assert_eq!(f.browser.count(Operation::InjectScripts), 0);

    let disabled = PageEvent::System {
        notice: SystemNotice::Mic,
        state: MicReport::Disabled,
    };
    f.controller.handle_page_event(disabled, tab.id).await;
    assert!(!f.controller.mic().is_enabled(tab.id));
    assert_eq!(
        f.drain(),
        vec![
            BroadcastEvent::mic(tab.id, true),
            BroadcastEvent::mic(tab.id, false)
        ]
    );

    let log = f.controller.sessions().log(tab.id);
    let notes: Vec<&str> = log.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(notes, vec!["Mic enabled", "Mic was stopped"]);
    assert!(log.iter().all(|e| e.role == LogRole::System));
}

#[tokio::test]
async fn test_page_event_from_closed_tab_ignored() {
    let f = fixture();
    let tab = f.open("https://example.com").await;
    f.host(HostEvent::TabRemoved { tab_id: tab.id }).await;

    f.controller
        .handle_page_event(
            PageEvent::Llm {
                text: "late reply".to_string(),
                tokens: Some(3),
                chars: None,
            },
            tab.id,
        )
        .await;
    assert!(f.controller.registry().get(tab.id).is_none());
    assert!(f.controller.sessions().get(tab.id).is_none());
}

#[tokio::test]
async fn test_toolbar_click_toggles_mic_and_opens_panel() {
    let mut f = fixture();
    let tab = f.open("https://example.com").await;

    f.host(HostEvent::ActionClicked { tab: tab.clone() }).await;
    assert!(f.controller.mic().is_enabled(tab.id));
    assert!(f.controller.registry().get(tab.id).unwrap().panel_open);
    assert!(f.browser.panel_shown(tab.id));

    f.host(HostEvent::ActionClicked { tab: tab.clone() }).await;
    assert!(!f.controller.mic().is_enabled(tab.id));
    assert_eq!(
        f.drain(),
        vec![
            BroadcastEvent::mic(tab.id, true),
            BroadcastEvent::PanelStateChanged {
                tab_id: tab.id,
                open: true
            },
            BroadcastEvent::mic(tab.id, false),
        ]
    );
}

#[tokio::test]
async fn test_toggle_command_targets_active_tab() {
    let f = fixture();
    f.open("https://one.example").await;
    let two = f.open("https://two.example").await;

    f.host(HostEvent::Command {
        name: TOGGLE_MIC_COMMAND.to_string(),
    })
    .await;
    assert_eq!(f.controller.registry().find_enabled_mic_tab(), Some(two.id));

    f.host(HostEvent::Command {
        name: "something-else".to_string(),
    })
    .await;
    assert_eq!(f.controller.registry().find_enabled_mic_tab(), Some(two.id));
}

#[tokio::test]
async fn test_activation_resends_activate() {
    let f = fixture();
    let one = f.open("https://one.example").await;
    f.open("https://two.example").await;
    f.request(Request::EnableMicForTab { tab_id: one.id }).await;

    f.host(HostEvent::TabActivated {
        tab_id: one.id,
        window_id: 1,
    })
    .await;
    assert_eq!(
        f.browser.delivered_to(one.id),
        vec![PageCommand::Activate, PageCommand::Activate]
    );
    assert_eq!(f.browser.badge(one.id), Some(true));
}

#[tokio::test]
async fn test_window_focus_tracks_last_normal_window() {
    let f = fixture();
    f.open("https://one.example").await;
    let other = f.browser.add_window(WindowKind::Normal);
    let elsewhere = f.browser.add_tab(other, "https://elsewhere.example");
    let popup = f.browser.add_window(WindowKind::Popup);

    f.host(HostEvent::WindowFocusChanged {
        window_id: Some(other),
    })
    .await;
    f.host(HostEvent::WindowFocusChanged {
        window_id: Some(popup),
    })
    .await;

    let Response::Tab { tab: Some(summary) } = f
        .request(Request::GetActiveTargetTab { window_id: None })
        .await
    else {
        panic!("expected a tab");
    };
    assert_eq!(summary.id, elsewhere.id);
}
