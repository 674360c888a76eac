//! Producers of activity readings.

pub mod fixed;
pub mod sensor;

pub use fixed::FixedActivity;
pub use sensor::SensorActivity;

use crate::domain::activity::ActivitySnapshot;
use crate::domain::errors::ProductionError;
use crate::domain::record::DataRecord;

fn snapshot_record(
    label: &str,
    snapshot: &ActivitySnapshot,
) -> Result<DataRecord, ProductionError> {
    snapshot
        .to_record()
        .map_err(|e| ProductionError::new(label, e.to_string()))
}
