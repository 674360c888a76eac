//! Observable data source: one producer, an ordered set of observers, and
//! synchronous delivery cycles between them.
//!
//! Each call to [`ObservableSource::run`] is one delivery cycle:
//!
//! 1. the producer builds a record (a failure ends the cycle, nobody is notified);
//! 2. the observer list is snapshotted;
//! 3. every observer in the snapshot receives the record, in attachment order,
//!    one at a time, on the calling thread.
//!
//! A failing or panicking observer is reported in the [`DeliveryReport`] and
//! logged, and the remaining observers are still served.

use crate::config::{DetachPolicy, DuplicatePolicy, SourceConfig};
use crate::domain::errors::{ObserverFailure, ProductionError, RunError, SubscriptionError};
use crate::domain::ports::{Observer, Producer};
use crate::domain::record::DataRecord;
use crate::infrastructure::observability::SourceMetrics;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, warn};

/// Whether a delivery cycle is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Idle,
    Delivering,
}

/// Outcome of one successful delivery cycle
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub record: DataRecord,
    /// Observers that accepted the record
    pub delivered: usize,
    /// Observers that failed, in delivery order
    pub failures: Vec<ObserverFailure>,
}

impl DeliveryReport {
    fn new(record: DataRecord) -> Self {
        Self {
            record,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// Number of observers the cycle tried to reach
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Source that pushes every produced record to its attached observers
pub struct ObservableSource<P: Producer> {
    producer: P,
    observers: Mutex<Vec<Arc<dyn Observer>>>,
    /// Serializes delivery cycles across threads.
    cycle: Mutex<()>,
    /// Thread currently running a cycle, if any.
    delivering_on: Mutex<Option<ThreadId>>,
    config: SourceConfig,
    metrics: Option<SourceMetrics>,
}

impl<P: Producer> ObservableSource<P> {
    /// Create a source with default policies
    pub fn new(producer: P) -> Self {
        Self::with_config(producer, SourceConfig::default())
    }

    pub fn with_config(producer: P, config: SourceConfig) -> Self {
        Self {
            producer,
            observers: Mutex::new(Vec::new()),
            cycle: Mutex::new(()),
            delivering_on: Mutex::new(None),
            config,
            metrics: None,
        }
    }

    /// Count cycles, deliveries and failures into `metrics`
    pub fn with_metrics(mut self, metrics: SourceMetrics) -> Self {
        metrics.set_attached(self.observer_count());
        self.metrics = Some(metrics);
        self
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&SourceMetrics> {
        self.metrics.as_ref()
    }

    /// Append an observer to the end of the delivery order.
    ///
    /// With [`DuplicatePolicy::Allow`] an observer attached twice receives
    /// each record twice. With [`DuplicatePolicy::Reject`] the second
    /// attachment fails and nothing changes.
    pub fn attach(&self, observer: Arc<dyn Observer>) -> Result<(), SubscriptionError> {
        let mut observers = lock(&self.observers);

        if self.config.duplicate_policy == DuplicatePolicy::Reject
            && observers.iter().any(|o| same_observer(o, &observer))
        {
            return Err(SubscriptionError::DuplicateAttachment {
                observer: observer.name().to_string(),
            });
        }

        debug!(
            "ObservableSource[{}]: attached {} (position {})",
            self.producer.name(),
            observer.name(),
            observers.len()
        );
        observers.push(observer);
        self.update_attached_gauge(observers.len());
        Ok(())
    }

    /// Attach `observer` unless it is already attached, as one step.
    ///
    /// Returns `true` when the observer was added. Concurrent callers racing
    /// on the same observer end up with exactly one attachment, whatever the
    /// duplicate policy.
    pub fn attach_if_absent(&self, observer: Arc<dyn Observer>) -> bool {
        let mut observers = lock(&self.observers);

        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }

        debug!(
            "ObservableSource[{}]: attached {} (position {})",
            self.producer.name(),
            observer.name(),
            observers.len()
        );
        observers.push(observer);
        self.update_attached_gauge(observers.len());
        true
    }

    /// Remove the first attachment of `observer`.
    ///
    /// Returns `Ok(true)` when something was removed. An observer that is not
    /// attached yields [`SubscriptionError::NotAttached`] under
    /// [`DetachPolicy::Strict`] and `Ok(false)` under [`DetachPolicy::Lenient`].
    pub fn detach(&self, observer: &Arc<dyn Observer>) -> Result<bool, SubscriptionError> {
        let mut observers = lock(&self.observers);

        match observers.iter().position(|o| same_observer(o, observer)) {
            Some(index) => {
                observers.remove(index);
                debug!(
                    "ObservableSource[{}]: detached {}",
                    self.producer.name(),
                    observer.name()
                );
                self.update_attached_gauge(observers.len());
                Ok(true)
            }
            None => match self.config.detach_policy {
                DetachPolicy::Strict => Err(SubscriptionError::NotAttached {
                    observer: observer.name().to_string(),
                }),
                DetachPolicy::Lenient => Ok(false),
            },
        }
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.observers).len()
    }

    pub fn is_attached(&self, observer: &Arc<dyn Observer>) -> bool {
        lock(&self.observers)
            .iter()
            .any(|o| same_observer(o, observer))
    }

    /// Names of the attached observers, in delivery order
    pub fn observer_names(&self) -> Vec<String> {
        lock(&self.observers)
            .iter()
            .map(|o| o.name().to_string())
            .collect()
    }

    pub fn state(&self) -> SourceState {
        if lock(&self.delivering_on).is_some() {
            SourceState::Delivering
        } else {
            SourceState::Idle
        }
    }

    /// Run one delivery cycle.
    ///
    /// Blocks until every observer attached when delivery started has been
    /// invoked. Observer failures never surface here; look at
    /// [`DeliveryReport::failures`]. Calling `run` from inside an observer of
    /// this same source returns [`RunError::Reentrant`]; a call from another
    /// thread waits for the current cycle to finish.
    pub fn run(&self) -> Result<DeliveryReport, RunError> {
        let current = thread::current().id();
        if *lock(&self.delivering_on) == Some(current) {
            return Err(RunError::Reentrant);
        }

        let _cycle = lock(&self.cycle);
        *lock(&self.delivering_on) = Some(current);
        let _delivering = DeliveringGuard {
            slot: &self.delivering_on,
        };

        let record = match self.produce() {
            Ok(record) => record,
            Err(e) => {
                error!("ObservableSource[{}]: {}", self.producer.name(), e);
                if let Some(metrics) = &self.metrics {
                    metrics.production_failures_total.inc();
                }
                return Err(e.into());
            }
        };

        // Changes made by observers during this cycle apply to the next one.
        let snapshot: Vec<Arc<dyn Observer>> = lock(&self.observers).clone();
        let mut report = DeliveryReport::new(record);

        for observer in &snapshot {
            match self.deliver(observer.as_ref(), &report.record) {
                Ok(()) => {
                    debug!(
                        "ObservableSource[{}]: delivered to {}",
                        self.producer.name(),
                        observer.name()
                    );
                    report.delivered += 1;
                }
                Err(failure) => {
                    warn!("ObservableSource[{}]: {}", self.producer.name(), failure);
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_observer_failures(&failure.observer);
                    }
                    report.failures.push(failure);
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.cycles_total.inc();
            metrics.deliveries_total.inc_by(report.delivered as f64);
        }

        info!(
            "ObservableSource[{}]: cycle complete ({} delivered, {} failed)",
            self.producer.name(),
            report.delivered,
            report.failures.len()
        );

        Ok(report)
    }

    /// A panicking producer ends the cycle like a failed one.
    fn produce(&self) -> Result<DataRecord, ProductionError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.producer.produce())) {
            Ok(result) => result,
            Err(payload) => Err(ProductionError::new(
                self.producer.name(),
                format!("panicked: {}", panic_message(payload.as_ref())),
            )),
        }
    }

    /// A panicking observer counts as a failed delivery.
    fn deliver(&self, observer: &dyn Observer, record: &DataRecord) -> Result<(), ObserverFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| observer.receive(record))) {
            Ok(result) => result,
            Err(payload) => Err(ObserverFailure::new(
                observer.name(),
                format!("panicked: {}", panic_message(payload.as_ref())),
            )),
        }
    }

    fn update_attached_gauge(&self, count: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.set_attached(count);
        }
    }
}

/// Clears the delivering marker when a cycle ends, including by unwinding.
struct DeliveringGuard<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl Drop for DeliveringGuard<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}

// Producer and observer panics are caught inside the cycle, so poisoning
// never leaves the guarded data half-modified.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn same_observer(a: &Arc<dyn Observer>, b: &Arc<dyn Observer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
