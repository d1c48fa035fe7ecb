//! Simulated IMU accuracy source and a file-backed calibration store.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use trackbench_traits::clock::{Clock, MonotonicClock};
use trackbench_traits::{AccuracySource, CalibrationStore, Channel};

/// Accuracy climbs one level per `ramp` on accel and gyro, and per `2 * ramp`
/// on the magnetometer, capped at 3.
pub struct SimulatedImu {
    clock: MonotonicClock,
    start: Instant,
    ramp_ms: u64,
}

impl SimulatedImu {
    pub fn new(ramp: Duration) -> Self {
        let clock = MonotonicClock::new();
        let start = clock.now();
        Self {
            clock,
            start,
            ramp_ms: u64::try_from(ramp.as_millis()).unwrap_or(u64::MAX).max(1),
        }
    }
}

impl AccuracySource for SimulatedImu {
    fn read_level(
        &mut self,
        channel: Channel,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        let per_level = match channel {
            Channel::Magnetometer => self.ramp_ms.saturating_mul(2),
            Channel::Accelerometer | Channel::Gyroscope => self.ramp_ms,
        };
        let level = (self.clock.ms_since(self.start) / per_level).min(3);
        Ok(u8::try_from(level).unwrap_or(3))
    }
}

/// Writes a small JSON record when a session saves; without a path the save
/// only logs.
pub struct FileStore {
    path: Option<PathBuf>,
    preset: String,
    channels: Vec<Channel>,
}

impl FileStore {
    pub fn new(path: Option<PathBuf>, preset: &str, channels: &[Channel]) -> Self {
        Self {
            path,
            preset: preset.to_string(),
            channels: channels.to_vec(),
        }
    }
}

impl CalibrationStore for FileStore {
    fn save(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(path) = &self.path else {
            tracing::info!(preset = %self.preset, "calibration saved (no --save path)");
            return Ok(());
        };
        let channels: Vec<&str> = self.channels.iter().map(|c| c.as_str()).collect();
        let record = serde_json::json!({
            "preset": self.preset,
            "channels": channels,
            "saved": true,
        });
        std::fs::write(path, format!("{record}\n"))?;
        tracing::info!(path = %path.display(), "calibration record written");
        Ok(())
    }
}
