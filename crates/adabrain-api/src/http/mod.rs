//! HTTP surface of the relay.
//!
//! A single WebSocket endpoint (mounted at both `/` and `/ws`) plus an
//! unauthenticated `/health` probe, with CORS and request tracing.

pub mod handlers;
pub mod router;
