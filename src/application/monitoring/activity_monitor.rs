use crate::domain::activity::User;
use crate::domain::ports::{Observer, Producer};
use crate::domain::record::DataRecord;
use crate::infrastructure::observable_source::{DeliveryReport, ObservableSource};
use crate::infrastructure::sinks::{DisplaySink, StorageSink};
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Watches a user's activities, storing and displaying every reading.
///
/// The monitor owns no source: it plugs its two sinks into whichever
/// activity source it is asked to watch.
pub struct ActivityMonitor {
    user: User,
    storage: Arc<StorageSink>,
    display: Arc<DisplaySink>,
    storage_handle: Arc<dyn Observer>,
    display_handle: Arc<dyn Observer>,
}

impl ActivityMonitor {
    pub fn new(user: User, storage: Arc<StorageSink>, display: Arc<DisplaySink>) -> Self {
        let storage_handle: Arc<dyn Observer> = storage.clone();
        let display_handle: Arc<dyn Observer> = display.clone();
        Self {
            user,
            storage,
            display,
            storage_handle,
            display_handle,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn storage(&self) -> &Arc<StorageSink> {
        &self.storage
    }

    pub fn display(&self) -> &Arc<DisplaySink> {
        &self.display
    }

    /// Subscribe storage then display to `source` and run one cycle.
    ///
    /// Sinks already attached are left alone, so monitoring the same source
    /// repeatedly, or from several threads, never doubles deliveries.
    pub fn monitor<P: Producer>(&self, source: &ObservableSource<P>) -> Result<DeliveryReport> {
        for handle in [&self.storage_handle, &self.display_handle] {
            source.attach_if_absent(Arc::clone(handle));
        }

        let report = source
            .run()
            .with_context(|| format!("Monitoring {} failed", source.producer().name()))?;

        info!(
            "ActivityMonitor[{}]: recorded activity from {}",
            self.user.name,
            source.producer().name()
        );
        Ok(report)
    }

    /// Unsubscribe both sinks from `source`; sinks that are not attached are skipped.
    pub fn release<P: Producer>(&self, source: &ObservableSource<P>) -> Result<()> {
        for handle in [&self.storage_handle, &self.display_handle] {
            if source.is_attached(handle) {
                source
                    .detach(handle)
                    .with_context(|| format!("Failed to detach {}", handle.name()))?;
            }
        }
        Ok(())
    }

    /// Stored readings that belong to this monitor's user
    pub fn history(&self) -> Vec<DataRecord> {
        self.storage
            .records()
            .into_iter()
            .filter(|r| r.get("user_id").and_then(Value::as_u64) == Some(self.user.user_id))
            .collect()
    }
}
