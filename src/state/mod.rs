//! Shared session state.

mod registry;

pub use registry::{Registry, Sink};
