pub mod activities;
pub mod monitoring;
