//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const MAX_SANE_RETRY_DELAY_MS: u64 = 10_000;
const MAX_SANE_RETRIES: u32 = 3;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_panel(config, &mut result);
        Self::validate_mic(config, &mut result);
        Self::validate_conversation(config, &mut result);
        Self::validate_guard(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_panel(config: &Config, result: &mut ValidationResult) {
        if config.panel.page_path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "panel.page_path",
                "page_path cannot be empty",
            ));
        }

        if config.panel.retry_delay_ms > MAX_SANE_RETRY_DELAY_MS {
            result.add_warning(ValidationWarning::new(
                "panel.retry_delay_ms",
                format!(
                    "retry_delay_ms is very high (>{}ms), panel opens will feel stuck",
                    MAX_SANE_RETRY_DELAY_MS
                ),
            ));
        }

        if config.panel.max_retries > MAX_SANE_RETRIES {
            result.add_warning(ValidationWarning::new(
                "panel.max_retries",
                format!(
                    "max_retries above {} rarely helps, recoverable refusals need a fresh user gesture",
                    MAX_SANE_RETRIES
                ),
            ));
        }
    }

    fn validate_mic(config: &Config, result: &mut ValidationResult) {
        if config.mic.listener_scripts.is_empty() {
            result.add_warning(ValidationWarning::new(
                "mic.listener_scripts",
                "no listener scripts configured, pages will never be activated",
            ));
        }
        for script in &config.mic.listener_scripts {
            if script.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "mic.listener_scripts",
                    "script path cannot be empty",
                ));
            }
        }
    }

    fn validate_conversation(config: &Config, result: &mut ValidationResult) {
        if config.conversation.max_entries == 0 {
            result.add_error(ValidationError::new(
                "conversation.max_entries",
                "max_entries must be greater than 0",
            ));
        }
        if config.conversation.context_window_tokens == 0 {
            result.add_error(ValidationError::new(
                "conversation.context_window_tokens",
                "context_window_tokens must be greater than 0",
            ));
        }
    }

    fn validate_guard(config: &Config, result: &mut ValidationResult) {
        for scheme in &config.guard.extra_restricted_schemes {
            let valid = !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+-.".contains(c));
            if !valid {
                result.add_error(ValidationError::new(
                    "guard.extra_restricted_schemes",
                    format!(
                        "'{}' is not a scheme name (lowercase ASCII, no ':')",
                        scheme
                    ),
                ));
            }
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
