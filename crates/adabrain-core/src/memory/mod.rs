//! Long-term memory port and the failure-tolerant gateway in front of it.
//!
//! `MemoryStore` is implemented in adabrain-infra. The relay never talks to
//! a store directly: it goes through [`gateway::MemoryGateway`], which
//! turns every store failure into an empty recall or a logged, dropped
//! write.

pub mod box_store;
pub mod gateway;
pub mod store;

#[cfg(test)]
pub(crate) mod fake;
