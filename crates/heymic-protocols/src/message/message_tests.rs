use super::*;
use crate::types::{TabChange, TabInfo, TabStatus};

#[test]
fn test_request_deserialize_enable_mic() {
    let json = r#"{"command":"enableMicForTab","tabId":2}"#;
    let req: Request = serde_json::from_str(json).unwrap();
    assert_eq!(req, Request::EnableMicForTab { tab_id: 2 });
    assert_eq!(req.name(), "enableMicForTab");
}

#[test]
fn test_request_deserialize_unit_variant() {
    let req: Request = serde_json::from_str(r#"{"command":"getMicEnabledTab"}"#).unwrap();
    assert_eq!(req, Request::GetMicEnabledTab);
}

#[test]
fn test_request_optional_fields_default() {
    let req: Request = serde_json::from_str(r#"{"command":"getConversationLog"}"#).unwrap();
    assert_eq!(req, Request::GetConversationLog { tab_id: None });

    let req: Request = serde_json::from_str(r#"{"command":"setDomEffects","enabled":true}"#).unwrap();
    assert_eq!(
        req,
        Request::SetDomEffects {
            tab_id: None,
            enabled: true
        }
    );
}

#[test]
fn test_request_unknown_command_rejected() {
    let result: Result<Request, _> = serde_json::from_str(r#"{"command":"launchRockets"}"#);
    assert!(result.is_err());
}

#[test]
fn test_response_shapes() {
    let json = serde_json::to_value(Response::MicState { enabled: true }).unwrap();
    assert_eq!(json, serde_json::json!({"enabled": true}));

    let json = serde_json::to_value(Response::ok()).unwrap();
    assert_eq!(json, serde_json::json!({"ok": true}));

    let json = serde_json::to_value(Response::Session {
        session_id: "abc".into(),
        url: Some("https://example.com".into()),
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({"sessionId": "abc", "url": "https://example.com"})
    );

    let json = serde_json::to_value(Response::Tab { tab: None }).unwrap();
    assert_eq!(json, serde_json::json!({"tab": null}));
}

#[test]
fn test_response_error_helper() {
    let resp = Response::error("boom");
    assert!(resp.is_error());
    let json = serde_json::to_value(resp).unwrap();
    assert_eq!(json, serde_json::json!({"ok": false, "error": "boom"}));
}

#[test]
fn test_broadcast_serialization() {
    let json = serde_json::to_value(BroadcastEvent::mic(1, false)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"event": "micStateChanged", "tabId": 1, "enabled": false})
    );

    let json = serde_json::to_value(BroadcastEvent::TabSessionReset {
        tab_id: 4,
        session_id: "new".into(),
        previous_session_id: Some("old".into()),
        url: None,
    })
    .unwrap();
    assert_eq!(json["event"], "tabSessionReset");
    assert_eq!(json["previousSessionId"], "old");
    assert_eq!(json["sessionId"], "new");
}

#[test]
fn test_broadcast_tab_id() {
    assert_eq!(BroadcastEvent::mic(9, true).tab_id(), 9);
    let ev = BroadcastEvent::PanelStateChanged { tab_id: 3, open: true };
    assert_eq!(ev.tab_id(), 3);
}

#[test]
fn test_page_event_deserialize() {
    let ev: PageEvent =
        serde_json::from_str(r#"{"event":"stt","text":"open youtube","tokens":3}"#).unwrap();
    assert_eq!(
        ev,
        PageEvent::Stt {
            text: "open youtube".into(),
            tokens: Some(3),
            chars: None
        }
    );

    let ev: PageEvent =
        serde_json::from_str(r#"{"event":"system","type":"mic","state":"disabled"}"#).unwrap();
    assert_eq!(
        ev,
        PageEvent::System {
            notice: SystemNotice::Mic,
            state: MicReport::Disabled
        }
    );
}

#[test]
fn test_page_command_serialization() {
    let json = serde_json::to_value(PageCommand::Stop).unwrap();
    assert_eq!(json, serde_json::json!({"command": "stop"}));
    let json = serde_json::to_value(PageCommand::DomEffects { enabled: true }).unwrap();
    assert_eq!(json, serde_json::json!({"command": "domEffects", "enabled": true}));
}

#[test]
fn test_host_event_roundtrip_tab_updated() {
    let json = r#"{
        "type": "tabUpdated",
        "tabId": 7,
        "change": {"status": "loading", "url": "chrome://settings"},
        "tab": {"id": 7, "windowId": 1, "url": "https://example.com"}
    }"#;
    let ev: HostEvent = serde_json::from_str(json).unwrap();
    match ev {
        HostEvent::TabUpdated { tab_id, change, tab } => {
            assert_eq!(tab_id, 7);
            assert_eq!(change.status, Some(TabStatus::Loading));
            assert_eq!(change.url.as_deref(), Some("chrome://settings"));
            assert_eq!(tab, TabInfo::new(7, 1, "https://example.com"));
        }
        _ => panic!("Wrong event type"),
    }
}

#[test]
fn test_host_event_window_focus_none() {
    let ev: HostEvent = serde_json::from_str(r#"{"type":"windowFocusChanged"}"#).unwrap();
    assert_eq!(ev, HostEvent::WindowFocusChanged { window_id: None });
}

#[test]
fn test_tab_change_helpers() {
    assert_eq!(TabChange::complete().status, Some(TabStatus::Complete));
    assert_eq!(TabChange::loading(Some("https://a")).url.as_deref(), Some("https://a"));
}
