//! # Hey Mic Core
//!
//! Synchronous building blocks of the tab coordinator.
//!
//! ## Components
//!
//! - [`RestrictedSurfaceGuard`] - Is an address eligible for UI attachment?
//! - [`classify`] - Fatal / recoverable / ignorable host error taxonomy
//! - [`TabStateRegistry`] - Per-tab live state records
//! - [`EventBus`] - Broadcast of state changes to UI surfaces

pub mod classifier;
pub mod events;
pub mod guard;
pub mod registry;

pub use classifier::{classify, ClassifiedError, ErrorClass};
pub use events::EventBus;
pub use guard::RestrictedSurfaceGuard;
pub use registry::{TabPatch, TabRecord, TabStateRegistry};
