//! Common types used across the Hey Mic workspace.

mod conversation;
mod panel;
mod tab;

pub use conversation::*;
pub use panel::*;
pub use tab::*;

#[cfg(test)]
#[path = "tab_tests.rs"]
mod tab_tests;
