//! Observer implementations shipped with the crate.

pub mod channel;
pub mod display;
pub mod storage;

pub use channel::ChannelSink;
pub use display::DisplaySink;
pub use storage::StorageSink;
