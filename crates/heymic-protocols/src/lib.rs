//! # Hey Mic Protocols
//!
//! Protocol definitions shared by the tab coordinator and its collaborators.
//! Contains only interface definitions and wire types - no implementations.
//!
//! ## Host Capabilities
//!
//! - [`TabsHost`] - Tab query/create/activate/remove and page messaging
//! - [`WindowsHost`] - Window lookup and focus
//! - [`ScriptingHost`] - Page-side listener injection
//! - [`StorageHost`] - Small key-value persistence
//! - [`ActionHost`] - Toolbar badge
//! - [`DockedPanelHost`] / [`SplitViewHost`] - Optional panel capabilities

pub mod error;
pub mod host;
pub mod message;
pub mod types;

pub use error::{ControllerError, HostError};
pub use host::{
    ActionHost, DockedPanelHost, HostEnvironment, HostResult, ScriptingHost, SplitViewHost,
    StorageHost, TabsHost, WindowsHost,
};
pub use message::{BroadcastEvent, HostEvent, PageCommand, PageEvent, Request, Response};
pub use types::*;
