use crate::application::activities::snapshot_record;
use crate::domain::activity::{ActivityKind, ActivitySnapshot, User};
use crate::domain::errors::ProductionError;
use crate::domain::ports::Producer;
use crate::domain::record::DataRecord;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Activity read from a simulated wearable sensor.
///
/// Readings are random within per-kind ranges. A sensor may be configured to
/// drop out after a number of readings, after which every cycle fails.
pub struct SensorActivity {
    kind: ActivityKind,
    user: User,
    label: String,
    rng: Mutex<StdRng>,
    readings: AtomicU64,
    fail_after: Option<u64>,
}

impl SensorActivity {
    pub fn new(kind: ActivityKind, user: &User) -> Self {
        Self::with_rng(kind, user, StdRng::from_os_rng())
    }

    /// Reproducible sensor for tests and replays
    pub fn seeded(kind: ActivityKind, user: &User, seed: u64) -> Self {
        Self::with_rng(kind, user, StdRng::seed_from_u64(seed))
    }

    fn with_rng(kind: ActivityKind, user: &User, rng: StdRng) -> Self {
        Self {
            kind,
            user: user.clone(),
            label: format!("{}-sensor/{}", kind, user.name),
            rng: Mutex::new(rng),
            readings: AtomicU64::new(0),
            fail_after: None,
        }
    }

    /// Drop out after `readings` successful readings
    pub fn fail_after(mut self, readings: u64) -> Self {
        self.fail_after = Some(readings);
        self
    }

    pub fn readings(&self) -> u64 {
        self.readings.load(Ordering::SeqCst)
    }

    fn sample(&self) -> (u64, f64, u64) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        match self.kind {
            ActivityKind::Walking => {
                let steps = rng.random_range(3_000..=8_000u64);
                (steps, steps as f64 * 0.0007, steps / 25)
            }
            ActivityKind::Running => {
                let steps = rng.random_range(5_000..=12_000u64);
                (steps, steps as f64 * 0.001, steps * 6 / 100)
            }
            ActivityKind::Swimming => {
                let km = rng.random_range(0.5..=2.5f64);
                (0, km, (km * 250.0) as u64)
            }
            ActivityKind::Cycling => {
                let km = rng.random_range(5.0..=30.0f64);
                (0, km, (km * 30.0) as u64)
            }
        }
    }
}

impl Producer for SensorActivity {
    fn produce(&self) -> Result<DataRecord, ProductionError> {
        if let Some(limit) = self.fail_after.filter(|&limit| self.readings() >= limit) {
            return Err(ProductionError::new(
                &self.label,
                format!("sensor dropped out after {} readings", limit),
            ));
        }

        let (steps, distance_km, calories) = self.sample();
        let snapshot = ActivitySnapshot {
            activity: self.kind,
            user_id: self.user.user_id,
            steps,
            distance_km: (distance_km * 100.0).round() / 100.0,
            calories,
            recorded_at: Utc::now(),
        };

        let record = snapshot_record(&self.label, &snapshot)?;
        let count = self.readings.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("SensorActivity[{}]: reading #{}", self.label, count);
        Ok(record)
    }

    fn name(&self) -> &str {
        &self.label
    }
}
