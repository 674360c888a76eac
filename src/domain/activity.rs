use crate::domain::errors::RecordError;
use crate::domain::record::DataRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user of the fitness tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    pub name: String,
}

impl User {
    pub fn new(user_id: u64, name: &str) -> Self {
        Self {
            user_id,
            name: name.to_string(),
        }
    }
}

/// Kind of tracked activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Walking,
    Running,
    Swimming,
    Cycling,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Walking,
        ActivityKind::Running,
        ActivityKind::Swimming,
        ActivityKind::Cycling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Walking => "Walking",
            ActivityKind::Running => "Running",
            ActivityKind::Swimming => "Swimming",
            ActivityKind::Cycling => "Cycling",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walking" => Ok(ActivityKind::Walking),
            "running" => Ok(ActivityKind::Running),
            "swimming" => Ok(ActivityKind::Swimming),
            "cycling" => Ok(ActivityKind::Cycling),
            _ => anyhow::bail!(
                "Invalid activity: {}. Must be 'walking', 'running', 'swimming', or 'cycling'",
                s
            ),
        }
    }
}

/// One reading of an activity, as pushed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub activity: ActivityKind,
    pub user_id: u64,
    pub steps: u64,
    #[serde(rename = "distance")]
    pub distance_km: f64,
    pub calories: u64,
    pub recorded_at: DateTime<Utc>,
}

impl ActivitySnapshot {
    pub fn to_record(&self) -> Result<DataRecord, RecordError> {
        DataRecord::from_serialize(self)
    }
}

impl TryFrom<&ActivitySnapshot> for DataRecord {
    type Error = RecordError;

    fn try_from(snapshot: &ActivitySnapshot) -> Result<Self, Self::Error> {
        snapshot.to_record()
    }
}
