use crate::domain::errors::ObserverFailure;
use crate::domain::ports::Observer;
use crate::domain::record::DataRecord;
use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Forwards records to another thread (a UI loop, a writer task, ...).
///
/// Never blocks the delivery cycle: a full or disconnected channel is
/// reported as a failed delivery.
pub struct ChannelSink {
    name: String,
    sender: Sender<DataRecord>,
}

impl ChannelSink {
    pub fn new(sender: Sender<DataRecord>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    pub fn unbounded() -> (Self, Receiver<DataRecord>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<DataRecord>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Observer for ChannelSink {
    fn receive(&self, record: &DataRecord) -> Result<(), ObserverFailure> {
        self.sender.try_send(record.clone()).map_err(|e| match e {
            TrySendError::Full(_) => ObserverFailure::new(&self.name, "channel full"),
            TrySendError::Disconnected(_) => {
                ObserverFailure::new(&self.name, "receiver disconnected")
            }
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
