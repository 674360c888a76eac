//! Prometheus metrics definitions for fitobserve
//!
//! All metrics use the `fitobserve_` prefix.

use prometheus::{Counter, CounterVec, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics for observable sources
#[derive(Clone)]
pub struct SourceMetrics {
    registry: Arc<Registry>,
    /// Completed delivery cycles
    pub cycles_total: Counter,
    /// Successful observer deliveries
    pub deliveries_total: Counter,
    /// Failed observer deliveries by observer
    pub observer_failures_total: CounterVec,
    /// Cycles aborted because the producer failed
    pub production_failures_total: Counter,
    /// Observers currently attached
    pub attached_observers: Gauge,
}

impl SourceMetrics {
    /// Create a new metrics set registered in its own registry
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles_total = Counter::with_opts(Opts::new(
            "fitobserve_cycles_total",
            "Completed delivery cycles",
        ))?;
        registry.register(Box::new(cycles_total.clone()))?;

        let deliveries_total = Counter::with_opts(Opts::new(
            "fitobserve_deliveries_total",
            "Records successfully delivered to observers",
        ))?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let observer_failures_total = CounterVec::new(
            Opts::new(
                "fitobserve_observer_failures_total",
                "Failed deliveries by observer",
            ),
            &["observer"],
        )?;
        registry.register(Box::new(observer_failures_total.clone()))?;

        let production_failures_total = Counter::with_opts(Opts::new(
            "fitobserve_production_failures_total",
            "Cycles aborted by a producer failure",
        ))?;
        registry.register(Box::new(production_failures_total.clone()))?;

        let attached_observers = Gauge::with_opts(Opts::new(
            "fitobserve_attached_observers",
            "Observers currently attached",
        ))?;
        registry.register(Box::new(attached_observers.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            cycles_total,
            deliveries_total,
            observer_failures_total,
            production_failures_total,
            attached_observers,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_observer_failures(&self, observer: &str) {
        self.observer_failures_total
            .with_label_values(&[observer])
            .inc();
    }

    pub fn set_attached(&self, count: usize) {
        self.attached_observers.set(count as f64);
    }
}
