use crate::domain::errors::ObserverFailure;
use crate::domain::ports::Observer;
use crate::domain::record::DataRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// In-memory store of every record it receives, in arrival order.
pub struct StorageSink {
    name: String,
    records: Mutex<Vec<DataRecord>>,
    capacity: Option<usize>,
}

impl StorageSink {
    pub fn new() -> Self {
        Self {
            name: "storage".to_string(),
            records: Mutex::new(Vec::new()),
            capacity: None,
        }
    }

    /// Storage that refuses new records once `capacity` are held
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn records(&self) -> Vec<DataRecord> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<DataRecord> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DataRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StorageSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for StorageSink {
    fn receive(&self, record: &DataRecord) -> Result<(), ObserverFailure> {
        let mut records = self.lock();

        if let Some(capacity) = self.capacity.filter(|&c| records.len() >= c) {
            return Err(ObserverFailure::new(
                &self.name,
                format!("store full ({} records)", capacity),
            ));
        }

        records.push(record.clone());
        debug!("StorageSink[{}]: stored record #{}", self.name, records.len());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
