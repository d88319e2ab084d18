//! Host error taxonomy.
//!
//! All string matching on host error messages lives here. Call sites only
//! ever look at [`ErrorClass`].

use heymic_protocols::error::HostError;
use serde::Serialize;
use thiserror::Error;

/// How a failed host call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// Capability absent or target invalid. Never retried; degrade.
    Fatal,
    /// Transient refusal, usually a missing user-activation context. Retried once.
    Recoverable,
    /// The desired state already holds. Treated as success.
    Ignorable,
}

/// A host error together with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class:?} host error: {source}")]
pub struct ClassifiedError {
    pub class: ErrorClass,
    #[source]
    pub source: HostError,
}

impl ClassifiedError {
    pub fn is_fatal(&self) -> bool {
        self.class == ErrorClass::Fatal
    }

    pub fn is_recoverable(&self) -> bool {
        self.class == ErrorClass::Recoverable
    }

    pub fn is_ignorable(&self) -> bool {
        self.class == ErrorClass::Ignorable
    }
}

impl From<HostError> for ClassifiedError {
    fn from(source: HostError) -> Self {
        Self {
            class: classify(&source),
            source,
        }
    }
}

const FATAL_MARKERS: &[&str] = &[
    "no tab with id",
    "no window with id",
    "invalid tab",
    "invalid window",
    "not supported",
    "is not a function",
    "cannot access",
    "missing host permission",
];

const IGNORABLE_MARKERS: &[&str] = &["already open", "already shown", "already bound"];

const RECOVERABLE_MARKERS: &[&str] = &[
    "user gesture",
    "user activation",
    "user interaction",
    "tabs cannot be edited right now",
    "try again",
    "window is not focused",
];

/// Classify a host error.
///
/// A missing page-side receiver is ignorable: nothing is listening, which is
/// an acceptable steady state. Unknown messages are fatal so they degrade
/// instead of looping.
pub fn classify(error: &HostError) -> ErrorClass {
    match error {
        HostError::NoSuchTab(_) | HostError::NoSuchWindow(_) | HostError::Unsupported(_) => {
            ErrorClass::Fatal
        }
        HostError::NoReceiver => ErrorClass::Ignorable,
        HostError::Runtime(message) => classify_message(message),
    }
}

/// Classify a raw host error message.
pub fn classify_message(message: &str) -> ErrorClass {
    let lower = message.to_ascii_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if has(FATAL_MARKERS) {
        ErrorClass::Fatal
    } else if has(IGNORABLE_MARKERS) {
        ErrorClass::Ignorable
    } else if has(RECOVERABLE_MARKERS) {
        ErrorClass::Recoverable
    } else {
        ErrorClass::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_errors() {
        assert_eq!(classify(&HostError::NoSuchTab(1)), ErrorClass::Fatal);
        assert_eq!(classify(&HostError::NoSuchWindow(1)), ErrorClass::Fatal);
        assert_eq!(
            classify(&HostError::Unsupported("sidePanel".into())),
            ErrorClass::Fatal
        );
        assert_eq!(classify(&HostError::NoReceiver), ErrorClass::Ignorable);
    }

    #[test]
    fn test_user_gesture_is_recoverable() {
        let err = HostError::runtime(
            "`sidePanel.open()` may only be called in response to a user gesture.",
        );
        assert_eq!(classify(&err), ErrorClass::Recoverable);
    }

    #[test]
    fn test_tab_drag_is_recoverable() {
        let err = HostError::runtime(
            "Tabs cannot be edited right now (user may be dragging a tab).",
        );
        assert_eq!(classify(&err), ErrorClass::Recoverable);
    }

    #[test]
    fn test_already_open_is_ignorable() {
        assert_eq!(
            classify_message("Side panel is already open for this tab"),
            ErrorClass::Ignorable
        );
    }

    #[test]
    fn test_invalid_target_is_fatal() {
        assert_eq!(classify_message("No tab with id: 123."), ErrorClass::Fatal);
        assert_eq!(classify_message("No window with id: 9."), ErrorClass::Fatal);
        assert_eq!(
            classify_message("Cannot access contents of url \"chrome://settings/\""),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_fatal_wins_over_other_markers() {
        assert_eq!(
            classify_message("No tab with id: 5; try again later"),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_unknown_message_is_fatal() {
        assert_eq!(classify_message("something odd happened"), ErrorClass::Fatal);
    }

    #[test]
    fn test_classified_error_from_host_error() {
        let err: ClassifiedError = HostError::runtime("Please try again").into();
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("Recoverable"));
    }
}
