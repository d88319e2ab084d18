//! Errors reported by host capability calls.

use thiserror::Error;

use crate::types::{TabId, WindowId};

/// A failed host call.
///
/// Most hosts report failures as free-form messages; those land in
/// [`HostError::Runtime`] and are classified by message text elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("No tab with id: {0}")]
    NoSuchTab(TabId),

    #[error("No window with id: {0}")]
    NoSuchWindow(WindowId),

    #[error("Capability unavailable: {0}")]
    Unsupported(String),

    #[error("Could not establish connection. Receiving end does not exist.")]
    NoReceiver,

    #[error("{0}")]
    Runtime(String),
}

impl HostError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}
