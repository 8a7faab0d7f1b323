//! Business logic and port definitions for the Ada Marie brain relay.
//!
//! This crate defines the ports the infrastructure layer implements
//! (`MemoryStore`, `AgentBackend`) and everything that drives a client
//! connection: sessions, the registry, and the streaming turn relay.
//! It depends only on `adabrain-types` -- never on `adabrain-infra` or
//! any database/HTTP crate.

pub mod agent;
pub mod lazy;
pub mod memory;
pub mod prompt;
pub mod relay;
pub mod session;
