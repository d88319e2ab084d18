//! In-memory browser host for Hey Mic.
//!
//! [`SimulatedBrowser`] implements every host capability trait against a
//! small tab/window model. Failures are scripted per operation so tests and
//! scenario replays can reproduce refusals such as a missing user gesture.
//!
//! The model does not emit events on its own. Drivers call
//! [`SimulatedBrowser::apply`] with a [`HostEvent`](heymic_protocols::HostEvent)
//! and then hand the same event to the controller.

mod browser;
mod failure;
mod scenario;

pub use browser::{CallRecord, SimulatedBrowser};
pub use failure::{FailureScript, Operation};
pub use scenario::{Scenario, SimulationError, Step};
