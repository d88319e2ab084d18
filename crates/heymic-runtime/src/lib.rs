//! # Hey Mic Runtime
//!
//! Session, mic enablement and companion panel lifecycle, driven by the
//! [`Controller`].

pub mod controller;
pub mod conversation;
pub mod focus;
pub mod host_call;
pub mod listener;
pub mod mic;
pub mod panel;
pub mod session;
pub mod settings;

pub use controller::Controller;
pub use conversation::{ConversationLog, ConversationStore};
pub use focus::FocusTracker;
pub use host_call::{best_effort, RetryPolicy};
pub use listener::PageBridge;
pub use mic::MicEnablementCoordinator;
pub use panel::{PanelLifecycleController, PanelOpenAttempt, PanelSettings, PanelStrategy};
pub use session::{SessionManager, SessionRecord};
pub use settings::SettingsStore;
