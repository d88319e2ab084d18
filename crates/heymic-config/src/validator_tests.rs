use super::*;

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_zero_max_entries_is_error() {
    let mut config = Config::default();
    config.conversation.max_entries = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "conversation.max_entries"));
}

#[test]
fn test_empty_page_path_is_error() {
    let mut config = Config::default();
    config.panel.page_path = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "panel.page_path"));
}

#[test]
fn test_long_retry_delay_is_warning() {
    let mut config = Config::default();
    config.panel.retry_delay_ms = 30_000;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "panel.retry_delay_ms"));
}

#[test]
fn test_many_retries_is_warning() {
    let mut config = Config::default();
    config.panel.max_retries = 5;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "panel.max_retries"));
}

#[test]
fn test_scheme_with_colon_is_error() {
    let mut config = Config::default();
    config.guard.extra_restricted_schemes = vec!["moz-extension:".to_string()];

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_uppercase_scheme_is_error() {
    let mut config = Config::default();
    config.guard.extra_restricted_schemes = vec!["Chrome".to_string()];

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "guard.extra_restricted_schemes"));
}

#[test]
fn test_valid_extra_schemes() {
    let mut config = Config::default();
    config.guard.extra_restricted_schemes =
        vec!["moz-extension".to_string(), "arc".to_string()];

    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_unknown_log_level_is_warning() {
    let mut config = Config::default();
    config.logging.level = "chatty".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_no_listener_scripts_is_warning() {
    let mut config = Config::default();
    config.mic.listener_scripts.clear();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "mic.listener_scripts"));
}

#[test]
fn test_multiple_errors_collected() {
    let mut config = Config::default();
    config.panel.page_path.clear();
    config.conversation.max_entries = 0;
    config.conversation.context_window_tokens = 0;

    let result = ConfigValidator::validate(&config);
    assert_eq!(result.errors.len(), 3);
}
