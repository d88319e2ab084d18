//! Messages crossing the coordinator boundary.
//!
//! - [`HostEvent`]: lifecycle notifications from the browser host
//! - [`Request`] / [`Response`]: the named-request interface for UI surfaces
//! - [`PageEvent`] / [`PageCommand`]: traffic with page-side listeners
//! - [`BroadcastEvent`]: fire-and-forget state notifications

mod broadcast;
mod host_event;
mod page;
mod request;
mod response;

pub use broadcast::*;
pub use host_event::*;
pub use page::*;
pub use request::*;
pub use response::*;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
