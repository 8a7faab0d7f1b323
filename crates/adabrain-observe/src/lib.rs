//! Observability for the Ada Marie brain relay: tracing subscriber setup
//! with optional OpenTelemetry export.

pub mod tracing_setup;
