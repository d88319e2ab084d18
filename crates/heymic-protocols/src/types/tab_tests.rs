use super::*;

#[test]
fn test_candidate_urls_committed_then_pending() {
    let tab = TabInfo::new(1, 1, "chrome://newtab/").with_pending_url("https://example.com/");
    let urls: Vec<_> = tab.candidate_urls().collect();
    assert_eq!(urls, vec!["chrome://newtab/", "https://example.com/"]);
}

#[test]
fn test_candidate_urls_skips_empty() {
    let mut tab = TabInfo::new(1, 1, "");
    assert_eq!(tab.candidate_urls().count(), 0);
    tab.pending_url = Some("https://example.com".to_string());
    assert_eq!(tab.candidate_urls().count(), 1);
}

#[test]
fn test_best_known_url_prefers_pending() {
    let tab = TabInfo::new(1, 1, "https://a.test/").with_pending_url("https://b.test/");
    assert_eq!(tab.best_known_url(), Some("https://b.test/"));

    let tab = TabInfo::new(1, 1, "https://a.test/");
    assert_eq!(tab.best_known_url(), Some("https://a.test/"));
}

#[test]
fn test_tab_query_matches() {
    let tab = TabInfo::new(3, 7, "https://example.com").active();
    assert!(TabQuery::all().matches(&tab));
    assert!(TabQuery::in_window(7).matches(&tab));
    assert!(TabQuery::active_in(7).matches(&tab));
    assert!(!TabQuery::in_window(8).matches(&tab));

    let inactive = TabInfo::new(4, 7, "https://example.com");
    assert!(!TabQuery::active_in(7).matches(&inactive));
}

#[test]
fn test_create_props_adjacent_to_anchor() {
    let anchor = TabInfo::new(5, 2, "https://example.com").with_index(3);
    let props = CreateTabProps::new("panel.html").adjacent_to(&anchor);
    assert_eq!(props.window_id, Some(2));
    assert_eq!(props.index, Some(4));
    assert!(props.active);
}

#[test]
fn test_tab_info_deserialize_camel_case() {
    let json = r#"{"id":9,"windowId":2,"url":"https://x.test","pendingUrl":"chrome://settings"}"#;
    let tab: TabInfo = serde_json::from_str(json).unwrap();
    assert_eq!(tab.window_id, 2);
    assert_eq!(tab.pending_url.as_deref(), Some("chrome://settings"));
    assert!(!tab.active);
}

#[test]
fn test_estimate_tokens() {
    assert_eq!(estimate_tokens(""), 0);
    assert_eq!(estimate_tokens("a"), 1);
    assert_eq!(estimate_tokens("abcd"), 1);
    assert_eq!(estimate_tokens("abcde"), 2);
}

#[test]
fn test_log_entry_explicit_sizes_win() {
    let entry = LogEntry::new(LogRole::Assistant, "hello world", Some(42), Some(7));
    assert_eq!(entry.approx_tokens, 42);
    assert_eq!(entry.chars, 7);

    let entry = LogEntry::new(LogRole::You, "hello world", None, None);
    assert_eq!(entry.approx_tokens, 3);
    assert_eq!(entry.chars, 11);
}

#[test]
fn test_panel_outcome_is_open() {
    assert!(PanelOutcome::Docked.is_open());
    assert!(PanelOutcome::CompanionTab { tab_id: 2, reused: false }.is_open());
    assert!(!PanelOutcome::Restricted.is_open());
    assert!(!PanelOutcome::GaveUp { reason: "x".into() }.is_open());
}

#[test]
fn test_panel_outcome_serialization() {
    let json = serde_json::to_string(&PanelOutcome::CompanionTab { tab_id: 2, reused: true }).unwrap();
    assert!(json.contains("\"kind\":\"companionTab\""));
    assert!(json.contains("\"tabId\":2"));
}
