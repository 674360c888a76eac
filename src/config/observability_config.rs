//! Observability configuration parsing from environment variables.
//!
//! This module handles loading log output and metrics configuration.

use std::env;
use std::str::FromStr;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!(
                "Invalid OBSERVABILITY_LOG_FORMAT: {}. Must be 'pretty' or 'json'",
                s
            ),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub log_format: LogFormat,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            enabled: env::var("OBSERVABILITY_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
            log_format: env::var("OBSERVABILITY_LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<LogFormat>()?,
        })
    }
}
