//! Per-connection session state and the process-wide registry.

pub mod registry;
pub mod state;
