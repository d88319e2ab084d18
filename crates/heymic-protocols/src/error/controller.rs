//! Errors surfaced to message-interface callers.

use thiserror::Error;

use super::HostError;
use crate::types::TabId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("No target tab available")]
    NoTargetTab,

    #[error("Host call failed: {0}")]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_display() {
        let err = ControllerError::InvalidRequest("missing sender".to_string());
        assert_eq!(err.to_string(), "Invalid request: missing sender");
    }

    #[test]
    fn test_from_host_error() {
        let err: ControllerError = HostError::NoSuchTab(3).into();
        assert!(matches!(err, ControllerError::Host(HostError::NoSuchTab(3))));
        assert!(err.to_string().contains("No tab with id: 3"));
    }

    #[test]
    fn test_tab_not_found_display() {
        assert!(ControllerError::TabNotFound(8).to_string().contains('8'));
    }
}
