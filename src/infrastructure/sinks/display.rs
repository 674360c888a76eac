use crate::domain::errors::ObserverFailure;
use crate::domain::ports::Observer;
use crate::domain::record::DataRecord;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Renders each record as a `Displaying data: <json>` line.
pub struct DisplaySink {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl DisplaySink {
    /// Display writing to stdout
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            name: "display".to_string(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Default for DisplaySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for DisplaySink {
    fn receive(&self, record: &DataRecord) -> Result<(), ObserverFailure> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        writeln!(writer, "Displaying data: {}", record)
            .and_then(|_| writer.flush())
            .map_err(|e| ObserverFailure::new(&self.name, format!("write failed: {}", e)))?;

        debug!("DisplaySink[{}]: rendered {} fields", self.name, record.len());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
