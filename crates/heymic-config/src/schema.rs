//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub mic: MicConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Companion panel behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Extension page shown in the docked panel and the fallback tab.
    #[serde(default = "default_page_path")]
    pub page_path: String,

    /// Fixed delay before retrying a recoverable host refusal.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Attempt a side-by-side layout when falling back to a companion tab.
    #[serde(default = "default_true")]
    pub split_view: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            page_path: default_page_path(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retries: default_max_retries(),
            split_view: true,
        }
    }
}

fn default_page_path() -> String {
    "user_popup.html".to_string()
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_max_retries() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Page-side listener scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicConfig {
    #[serde(default = "default_listener_scripts")]
    pub listener_scripts: Vec<String>,
}

impl Default for MicConfig {
    fn default() -> Self {
        Self {
            listener_scripts: default_listener_scripts(),
        }
    }
}

fn default_listener_scripts() -> Vec<String> {
    ["speech_adapter.js", "voice_commands.js", "content.js"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Conversation log limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_context_window_tokens")]
    pub context_window_tokens: u32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            context_window_tokens: default_context_window_tokens(),
        }
    }
}

fn default_max_entries() -> usize {
    200
}

fn default_context_window_tokens() -> u32 {
    4096
}

/// Extra schemes treated as restricted on top of the built-in set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub extra_restricted_schemes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "~/.heymic/debug".to_string()
}
