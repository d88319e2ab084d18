//! Error types for the Hey Mic protocol layer.

mod controller;
mod host;

pub use controller::*;
pub use host::*;
