//! Shared domain types for the Ada Marie brain relay.
//!
//! This crate contains the types passed between the relay layers:
//! behavioural modes, conversation history, upstream agent events,
//! memory records, the client wire protocol, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod character;
pub mod chat;
pub mod config;
pub mod error;
pub mod memory;
pub mod mode;
pub mod protocol;
