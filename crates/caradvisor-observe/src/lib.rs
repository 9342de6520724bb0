//! Observability for Car Advisor: tracing subscriber setup with optional
//! OpenTelemetry span export.

pub mod tracing_setup;
