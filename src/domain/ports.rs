use crate::domain::errors::{ObserverFailure, ProductionError};
use crate::domain::record::DataRecord;

/// Something that wants to hear about every record a source produces.
///
/// Implementations own their side effects. A returned error (or a panic)
/// only marks this delivery as failed; the source keeps going.
pub trait Observer: Send + Sync {
    fn receive(&self, record: &DataRecord) -> Result<(), ObserverFailure>;

    /// Label used in logs, metrics and failure reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Builds one record per delivery cycle.
pub trait Producer: Send + Sync {
    fn produce(&self) -> Result<DataRecord, ProductionError>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Producer for F
where
    F: Fn() -> Result<DataRecord, ProductionError> + Send + Sync,
{
    fn produce(&self) -> Result<DataRecord, ProductionError> {
        self()
    }

    fn name(&self) -> &str {
        "closure"
    }
}
