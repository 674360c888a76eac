use crate::application::activities::snapshot_record;
use crate::domain::activity::{ActivityKind, ActivitySnapshot, User};
use crate::domain::errors::ProductionError;
use crate::domain::ports::Producer;
use crate::domain::record::DataRecord;
use chrono::Utc;

/// Activity that reports the same reading on every cycle.
///
/// Useful as a stand-in while no real sensor is wired, and in tests.
#[derive(Debug, Clone)]
pub struct FixedActivity {
    kind: ActivityKind,
    user: User,
    label: String,
}

impl FixedActivity {
    pub fn new(kind: ActivityKind, user: &User) -> Self {
        Self {
            kind,
            user: user.clone(),
            label: format!("{}/{}", kind, user.name),
        }
    }

    pub fn walking(user: &User) -> Self {
        Self::new(ActivityKind::Walking, user)
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Steps, distance (km) and calories reported for each kind
    fn reading(&self) -> (u64, f64, u64) {
        match self.kind {
            ActivityKind::Walking => (5000, 3.5, 200),
            ActivityKind::Running => (8000, 6.4, 480),
            ActivityKind::Swimming => (0, 1.5, 350),
            ActivityKind::Cycling => (0, 15.0, 450),
        }
    }
}

impl Producer for FixedActivity {
    fn produce(&self) -> Result<DataRecord, ProductionError> {
        let (steps, distance_km, calories) = self.reading();
        let snapshot = ActivitySnapshot {
            activity: self.kind,
            user_id: self.user.user_id,
            steps,
            distance_km,
            calories,
            recorded_at: Utc::now(),
        };
        snapshot_record(&self.label, &snapshot)
    }

    fn name(&self) -> &str {
        &self.label
    }
}
