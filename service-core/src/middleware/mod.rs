pub mod metrics;
pub mod readiness;
pub mod tracing;
