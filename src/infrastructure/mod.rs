pub mod observability;
pub mod observable_source;
pub mod sinks;

pub use observable_source::{DeliveryReport, ObservableSource, SourceState};
pub use sinks::{ChannelSink, DisplaySink, StorageSink};
