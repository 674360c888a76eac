use thiserror::Error;

/// Raised by a producer that could not build a record for the current cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Production failed in {source_name}: {reason}")]
pub struct ProductionError {
    pub source_name: String,
    pub reason: String,
}

impl ProductionError {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Raised by a single observer while handling a record.
///
/// Never escapes a delivery cycle: the source records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Observer {observer} failed: {reason}")]
pub struct ObserverFailure {
    pub observer: String,
    pub reason: String,
}

impl ObserverFailure {
    pub fn new(observer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to attaching and detaching observers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("Observer {observer} is already attached")]
    DuplicateAttachment { observer: String },

    #[error("Observer {observer} is not attached")]
    NotAttached { observer: String },
}

/// Errors surfaced to the caller of a delivery cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error(transparent)]
    Production(#[from] ProductionError),

    #[error("run() called from inside a delivery cycle of the same source")]
    Reentrant,
}

/// Errors related to building data records
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record payload must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
