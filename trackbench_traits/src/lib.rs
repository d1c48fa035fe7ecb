//! Hardware-facing seams shared by the bench crates.
//!
//! The analysis core never talks to sensors directly: accuracy levels come in
//! through [`AccuracySource`], persistence of a converged calibration goes out
//! through [`CalibrationStore`], and all timing goes through [`Clock`].
pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::fmt;
use std::str::FromStr;

/// A sensor channel that reports a discrete accuracy level (0 = unreliable .. 3 = high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Accelerometer,
    Gyroscope,
    Magnetometer,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::Accelerometer,
        Channel::Gyroscope,
        Channel::Magnetometer,
    ];

    /// Short name used in config files and CSV headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Accelerometer => "accel",
            Channel::Gyroscope => "gyro",
            Channel::Magnetometer => "mag",
        }
    }

    /// What the operator should do to raise this channel's accuracy.
    pub fn operator_hint(self) -> &'static str {
        match self {
            Channel::Accelerometer => "rotate through faces",
            Channel::Gyroscope => "hold still",
            Channel::Magnetometer => "rotate on each axis",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel '{}' (expected accel, gyro or mag)", self.0)
    }
}

impl std::error::Error for UnknownChannel {}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accel" | "accelerometer" => Ok(Channel::Accelerometer),
            "gyro" | "gyroscope" => Ok(Channel::Gyroscope),
            "mag" | "magnetometer" => Ok(Channel::Magnetometer),
            _ => Err(UnknownChannel(s.to_string())),
        }
    }
}

/// Source of live per-channel accuracy levels (e.g. IMU status bits).
pub trait AccuracySource {
    fn read_level(
        &mut self,
        channel: Channel,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>>;
}

/// One-shot persistence action run when a calibration has converged.
pub trait CalibrationStore {
    fn save(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
