pub mod activity_monitor;

pub use activity_monitor::ActivityMonitor;
