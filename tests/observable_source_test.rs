use fitobserve::config::{DetachPolicy, DuplicatePolicy, SourceConfig};
use fitobserve::domain::{
    DataRecord, Observer, ObserverFailure, ProductionError, RunError, SubscriptionError,
};
use fitobserve::infrastructure::{ObservableSource, SourceState};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

/// Shared log of (observer, record) pairs in delivery order
type Journal = Arc<Mutex<Vec<(String, DataRecord)>>>;

struct RecordingObserver {
    name: String,
    journal: Journal,
}

impl RecordingObserver {
    fn new(name: &str, journal: &Journal) -> Arc<dyn Observer> {
        Arc::new(Self {
            name: name.to_string(),
            journal: Arc::clone(journal),
        })
    }
}

impl Observer for RecordingObserver {
    fn receive(&self, record: &DataRecord) -> Result<(), ObserverFailure> {
        self.journal
            .lock()
            .unwrap()
            .push((self.name.clone(), record.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct FailingObserver;

impl Observer for FailingObserver {
    fn receive(&self, _record: &DataRecord) -> Result<(), ObserverFailure> {
        Err(ObserverFailure::new("failing", "disk full"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct PanickingObserver;

impl Observer for PanickingObserver {
    fn receive(&self, _record: &DataRecord) -> Result<(), ObserverFailure> {
        panic!("observer exploded");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

fn walking_record() -> DataRecord {
    DataRecord::try_from(json!({"activity": "Walking", "steps": 5000})).unwrap()
}

fn walking() -> Result<DataRecord, ProductionError> {
    Ok(walking_record())
}

fn names(journal: &Journal) -> Vec<String> {
    journal
        .lock()
        .unwrap()
        .iter()
        .map(|(name, _)| name.clone())
        .collect()
}

#[test]
fn test_storage_then_display_scenario() {
    let journal = Journal::default();
    let storage = RecordingObserver::new("storage", &journal);
    let display = RecordingObserver::new("display", &journal);

    let source = ObservableSource::new(walking);
    source.attach(storage).unwrap();
    source.attach(display).unwrap();

    let report = source.run().unwrap();

    let entries = journal.lock().unwrap().clone();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "storage");
    assert_eq!(entries[1].0, "display");
    assert_eq!(entries[0].1, walking_record());
    assert_eq!(entries[1].1, walking_record());
    assert_eq!(report.delivered, 2);
    assert_eq!(report.record, walking_record());
}

#[test]
fn test_delivery_order_is_attach_order() {
    let journal = Journal::default();
    let source = ObservableSource::new(walking);
    for name in ["a", "b", "c", "d"] {
        source.attach(RecordingObserver::new(name, &journal)).unwrap();
    }

    source.run().unwrap();

    assert_eq!(names(&journal), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_same_record_instance_reaches_every_observer() {
    let journal = Journal::default();
    let source = ObservableSource::new(walking);
    source.attach(RecordingObserver::new("a", &journal)).unwrap();
    source.attach(RecordingObserver::new("b", &journal)).unwrap();

    source.run().unwrap();

    let entries = journal.lock().unwrap();
    assert!(entries[0].1.ptr_eq(&entries[1].1));
}

#[test]
fn test_net_effect_of_attach_detach_sequence() {
    let journal = Journal::default();
    let a = RecordingObserver::new("a", &journal);
    let b = RecordingObserver::new("b", &journal);
    let c = RecordingObserver::new("c", &journal);

    let source = ObservableSource::new(walking);
    source.attach(a.clone()).unwrap();
    source.attach(b.clone()).unwrap();
    source.attach(a.clone()).unwrap();
    source.attach(c.clone()).unwrap();
    assert_eq!(source.observer_names(), vec!["a", "b", "a", "c"]);

    // Detach removes the first occurrence only
    assert!(source.detach(&a).unwrap());
    assert_eq!(source.observer_names(), vec!["b", "a", "c"]);

    assert!(source.detach(&c).unwrap());
    source.attach(c.clone()).unwrap();
    assert!(source.detach(&b).unwrap());
    assert_eq!(source.observer_names(), vec!["a", "c"]);

    source.run().unwrap();
    assert_eq!(names(&journal), vec!["a", "c"]);
}

#[test]
fn test_duplicate_attach_delivers_twice_by_default() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let journal = Journal::default();
    let observer = RecordingObserver::new("dup", &journal);

    let source = ObservableSource::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        walking()
    });
    source.attach(observer.clone()).unwrap();
    source.attach(observer.clone()).unwrap();

    let report = source.run().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(report.delivered, 2);
    assert_eq!(names(&journal), vec!["dup", "dup"]);
}

#[test]
fn test_duplicate_attach_rejected_under_reject_policy() {
    let journal = Journal::default();
    let observer = RecordingObserver::new("dup", &journal);
    let config = SourceConfig::default().with_duplicate_policy(DuplicatePolicy::Reject);

    let source = ObservableSource::with_config(walking, config);
    source.attach(observer.clone()).unwrap();
    let err = source.attach(observer.clone()).unwrap_err();

    assert_eq!(
        err,
        SubscriptionError::DuplicateAttachment {
            observer: "dup".to_string()
        }
    );
    assert_eq!(source.observer_count(), 1);

    source.run().unwrap();
    assert_eq!(names(&journal), vec!["dup"]);
}

#[test]
fn test_run_without_observers_still_produces_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let source = ObservableSource::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        walking()
    });

    let report = source.run().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(report.attempted(), 0);
    assert!(report.is_clean());
}

#[test]
fn test_production_failure_delivers_nothing() {
    let journal = Journal::default();
    let source = ObservableSource::new(|| -> Result<DataRecord, ProductionError> {
        Err(ProductionError::new("pedometer", "sensor offline"))
    });
    source.attach(RecordingObserver::new("a", &journal)).unwrap();
    source.attach(RecordingObserver::new("b", &journal)).unwrap();

    let err = source.run().unwrap_err();

    assert_eq!(
        err,
        RunError::Production(ProductionError::new("pedometer", "sensor offline"))
    );
    assert!(journal.lock().unwrap().is_empty());
    assert_eq!(source.state(), SourceState::Idle);
}

#[test]
fn test_failing_observer_does_not_block_others() {
    let journal = Journal::default();
    let source = ObservableSource::new(walking);
    source.attach(RecordingObserver::new("first", &journal)).unwrap();
    source.attach(Arc::new(FailingObserver)).unwrap();
    source.attach(RecordingObserver::new("last", &journal)).unwrap();

    let report = source.run().unwrap();

    assert_eq!(names(&journal), vec!["first", "last"]);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].observer, "failing");
    assert_eq!(report.failures[0].reason, "disk full");
}

#[test]
fn test_panicking_observer_is_isolated() {
    let journal = Journal::default();
    let source = ObservableSource::new(walking);
    source.attach(Arc::new(PanickingObserver)).unwrap();
    source.attach(RecordingObserver::new("after", &journal)).unwrap();

    let report = source.run().unwrap();

    assert_eq!(names(&journal), vec!["after"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].observer, "panicking");
    assert!(report.failures[0].reason.contains("observer exploded"));
    assert_eq!(source.state(), SourceState::Idle);

    // The source stays usable after a panic
    assert!(source.run().is_ok());
}

#[test]
fn test_detached_observer_misses_later_cycles() {
    let journal = Journal::default();
    let a = RecordingObserver::new("a", &journal);
    let b = RecordingObserver::new("b", &journal);
    let source = ObservableSource::new(walking);
    source.attach(a.clone()).unwrap();
    source.attach(b.clone()).unwrap();

    source.run().unwrap();
    source.detach(&a).unwrap();
    source.run().unwrap();

    assert_eq!(names(&journal), vec!["a", "b", "b"]);
}

#[test]
fn test_detach_absent_strict_and_lenient() {
    let journal = Journal::default();
    let stranger = RecordingObserver::new("stranger", &journal);

    let strict = ObservableSource::new(walking);
    assert_eq!(
        strict.detach(&stranger).unwrap_err(),
        SubscriptionError::NotAttached {
            observer: "stranger".to_string()
        }
    );

    let lenient = ObservableSource::with_config(
        walking,
        SourceConfig::default().with_detach_policy(DetachPolicy::Lenient),
    );
    assert!(!lenient.detach(&stranger).unwrap());
    assert_eq!(lenient.observer_count(), 0);
}

/// Observer that attaches or detaches other observers on its source while
/// it is being notified.
struct MutatingObserver {
    journal: Journal,
    source: OnceLock<Weak<ObservableSource<fn() -> Result<DataRecord, ProductionError>>>>,
    to_attach: Arc<dyn Observer>,
    to_detach: Arc<dyn Observer>,
}

impl Observer for MutatingObserver {
    fn receive(&self, record: &DataRecord) -> Result<(), ObserverFailure> {
        self.journal
            .lock()
            .unwrap()
            .push(("mutator".to_string(), record.clone()));
        if let Some(source) = self.source.get().and_then(Weak::upgrade) {
            source.attach(Arc::clone(&self.to_attach)).ok();
            source.detach(&self.to_detach).ok();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mutator"
    }
}

#[test]
fn test_reentrant_mutation_applies_to_next_cycle() {
    let journal = Journal::default();
    let late = RecordingObserver::new("late", &journal);
    let victim = RecordingObserver::new("victim", &journal);

    let producer: fn() -> Result<DataRecord, ProductionError> = walking;
    let source = Arc::new(ObservableSource::new(producer));
    let mutator = Arc::new(MutatingObserver {
        journal: Arc::clone(&journal),
        source: OnceLock::new(),
        to_attach: late.clone(),
        to_detach: victim.clone(),
    });
    mutator.source.set(Arc::downgrade(&source)).ok();

    source.attach(mutator.clone()).unwrap();
    source.attach(victim.clone()).unwrap();

    // In-flight cycle uses the snapshot: victim still served, late not yet
    source.run().unwrap();
    assert_eq!(names(&journal), vec!["mutator", "victim"]);

    journal.lock().unwrap().clear();
    source.run().unwrap();
    assert_eq!(names(&journal), vec!["mutator", "late"]);
}

struct RerunningObserver {
    source: OnceLock<Weak<ObservableSource<fn() -> Result<DataRecord, ProductionError>>>>,
    outcome: Mutex<Option<Result<(), RunError>>>,
}

impl Observer for RerunningObserver {
    fn receive(&self, _record: &DataRecord) -> Result<(), ObserverFailure> {
        if let Some(source) = self.source.get().and_then(Weak::upgrade) {
            assert_eq!(source.state(), SourceState::Delivering);
            let outcome = source.run().map(|_| ());
            *self.outcome.lock().unwrap() = Some(outcome);
        }
        Ok(())
    }
}

#[test]
fn test_reentrant_run_is_refused() {
    let producer: fn() -> Result<DataRecord, ProductionError> = walking;
    let source = Arc::new(ObservableSource::new(producer));
    let observer = Arc::new(RerunningObserver {
        source: OnceLock::new(),
        outcome: Mutex::new(None),
    });
    observer.source.set(Arc::downgrade(&source)).ok();
    source.attach(observer.clone()).unwrap();

    let report = source.run().unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(
        *observer.outcome.lock().unwrap(),
        Some(Err(RunError::Reentrant))
    );
    assert_eq!(source.state(), SourceState::Idle);
}

#[test]
fn test_cycles_from_many_threads_are_serialized() {
    struct OverlapDetector {
        active: AtomicUsize,
        overlaps: AtomicUsize,
        received: AtomicUsize,
    }

    impl Observer for OverlapDetector {
        fn receive(&self, _record: &DataRecord) -> Result<(), ObserverFailure> {
            if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let detector = Arc::new(OverlapDetector {
        active: AtomicUsize::new(0),
        overlaps: AtomicUsize::new(0),
        received: AtomicUsize::new(0),
    });
    let source = Arc::new(ObservableSource::new(walking));
    source.attach(detector.clone()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let source = Arc::clone(&source);
            std::thread::spawn(move || {
                for _ in 0..5 {
                    source.run().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(detector.received.load(Ordering::SeqCst), 20);
    assert_eq!(detector.overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_panicking_observer_never_unwinds_out_of_run() {
    let journal = Journal::default();
    let config = SourceConfig::default()
        .with_duplicate_policy(DuplicatePolicy::Reject)
        .with_detach_policy(DetachPolicy::Lenient);
    let source = ObservableSource::with_config(walking, config);
    source.attach(RecordingObserver::new("before", &journal)).unwrap();
    source.attach(Arc::new(PanickingObserver)).unwrap();
    source.attach(RecordingObserver::new("after", &journal)).unwrap();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| source.run()));

    let report = outcome
        .expect("run() must not unwind")
        .expect("run() must succeed");
    assert_eq!(names(&journal), vec!["before", "after"]);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].observer, "panicking");
}

#[test]
fn test_panicking_producer_becomes_production_error() {
    let journal = Journal::default();
    let source = ObservableSource::new(|| -> Result<DataRecord, ProductionError> {
        panic!("pedometer crashed");
    });
    source.attach(RecordingObserver::new("a", &journal)).unwrap();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| source.run()));

    let err = outcome.expect("run() must not unwind").unwrap_err();
    match err {
        RunError::Production(e) => {
            assert_eq!(e.source_name, "closure");
            assert!(e.reason.contains("pedometer crashed"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(journal.lock().unwrap().is_empty());
    assert_eq!(source.state(), SourceState::Idle);

    // The source stays usable after a producer panic
    assert!(source.run().is_err());
    assert_eq!(source.state(), SourceState::Idle);
}

#[test]
fn test_attach_if_absent_is_idempotent() {
    let journal = Journal::default();
    let observer = RecordingObserver::new("once", &journal);
    let source = ObservableSource::new(walking);

    assert!(source.attach_if_absent(observer.clone()));
    assert!(!source.attach_if_absent(observer.clone()));
    assert_eq!(source.observer_count(), 1);

    source.run().unwrap();
    assert_eq!(names(&journal), vec!["once"]);
}

#[test]
fn test_attach_if_absent_from_many_threads() {
    let journal = Journal::default();
    let observer = RecordingObserver::new("shared", &journal);
    let source = Arc::new(ObservableSource::new(walking));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let source = Arc::clone(&source);
            let observer = Arc::clone(&observer);
            std::thread::spawn(move || source.attach_if_absent(observer))
        })
        .collect();
    let added = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|added| *added)
        .count();

    assert_eq!(added, 1);
    assert_eq!(source.observer_count(), 1);
}
