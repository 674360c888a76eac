//! Configuration module for fitobserve.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: subscription policies and observability.

mod observability_config;
mod source_config;

pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use source_config::{DetachPolicy, DuplicatePolicy, SourceConfig};

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Source (from SourceConfig)
    pub duplicate_policy: DuplicatePolicy,
    pub detach_policy: DetachPolicy,

    // Observability (from ObservabilityEnvConfig)
    pub observability_enabled: bool,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let source = SourceConfig::from_env().context("Failed to load source config")?;
        let observability =
            ObservabilityEnvConfig::from_env().context("Failed to load observability config")?;

        Ok(Self {
            duplicate_policy: source.duplicate_policy,
            detach_policy: source.detach_policy,

            observability_enabled: observability.enabled,
            log_format: observability.log_format,
        })
    }

    /// Policies to hand to an `ObservableSource`
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            duplicate_policy: self.duplicate_policy,
            detach_policy: self.detach_policy,
        }
    }
}
