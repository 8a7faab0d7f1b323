//! Upstream conversational agent port.
//!
//! `AgentBackend` is implemented in adabrain-infra. Events for a turn are
//! delivered through a [`subscription::Subscription`], a per-turn ordered
//! channel that is revoked when dropped. The relay goes through
//! [`gateway::AgentGateway`], which maps an absent or failing backend to
//! the degraded echo mode.

pub mod backend;
pub mod box_backend;
pub mod gateway;
pub mod subscription;

#[cfg(test)]
pub(crate) mod fake;
