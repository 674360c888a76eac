//! Push-based observability for fitobserve
//!
//! Delivery cycles are traced through `tracing`; counters live in a
//! per-source prometheus registry that callers render on demand.

pub mod metrics;

pub use metrics::SourceMetrics;
