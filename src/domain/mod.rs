// Fitness tracking domain (users, activities)
pub mod activity;

// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

// Data records passed from producers to observers
pub mod record;

pub use errors::{ObserverFailure, ProductionError, RecordError, RunError, SubscriptionError};
pub use ports::{Observer, Producer};
pub use record::DataRecord;
