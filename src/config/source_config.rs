//! Subscription policy configuration parsing from environment variables.
//!
//! Controls how an observable source treats repeated attachments and
//! detaching an observer that is not attached.

use anyhow::Result;
use std::env;
use std::str::FromStr;

/// What `attach` does with an observer that is already attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Append again; the observer receives each record once per attachment.
    #[default]
    Allow,
    /// Refuse the second attachment with `SubscriptionError::DuplicateAttachment`.
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(DuplicatePolicy::Allow),
            "reject" => Ok(DuplicatePolicy::Reject),
            _ => anyhow::bail!(
                "Invalid OBSERVER_DUPLICATE_POLICY: {}. Must be 'allow' or 'reject'",
                s
            ),
        }
    }
}

/// What `detach` does with an observer that is not attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetachPolicy {
    /// Report `SubscriptionError::NotAttached`.
    #[default]
    Strict,
    /// Succeed without changing anything.
    Lenient,
}

impl FromStr for DetachPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(DetachPolicy::Strict),
            "lenient" => Ok(DetachPolicy::Lenient),
            _ => anyhow::bail!(
                "Invalid OBSERVER_DETACH_POLICY: {}. Must be 'strict' or 'lenient'",
                s
            ),
        }
    }
}

/// Behaviour knobs of an `ObservableSource`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub detach_policy: DetachPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Allow,
            detach_policy: DetachPolicy::Strict,
        }
    }
}

impl SourceConfig {
    pub fn from_env() -> Result<Self> {
        let duplicate_policy = env::var("OBSERVER_DUPLICATE_POLICY")
            .unwrap_or_else(|_| "allow".to_string())
            .parse::<DuplicatePolicy>()?;

        let detach_policy = env::var("OBSERVER_DETACH_POLICY")
            .unwrap_or_else(|_| "strict".to_string())
            .parse::<DetachPolicy>()?;

        Ok(Self {
            duplicate_policy,
            detach_policy,
        })
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_detach_policy(mut self, policy: DetachPolicy) -> Self {
        self.detach_policy = policy;
        self
    }
}
