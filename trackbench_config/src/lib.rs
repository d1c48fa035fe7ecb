#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and log ingestion for the tracking bench.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `ingest` loads the sample logs (`T,ENC,IMU,Lag`) and accuracy-level
//!   logs (`T,accel,gyro,mag`) with strict per-field parsing.
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::Deserializer;
use trackbench_traits::Channel;

pub mod ingest;

pub use ingest::{
    IngestError, LevelRow, SampleRow, load_levels_csv, load_samples_csv, read_levels_csv,
    read_samples_csv,
};

/// Raw encoder steps per revolution.
pub const ENCODER_STEPS: i32 = 4096;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EncoderCfg {
    /// Raw step reported when the lever sits at its mechanical zero.
    pub axis_center: i32,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self { axis_center: 406 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisCfg {
    /// Reference moves at or below this many degrees per interval are not
    /// classified as trailing or leading.
    pub moving_threshold_deg: f64,
    /// Velocity strata size is `intervals / strata_divisor` (4 = quartiles).
    pub strata_divisor: usize,
}

impl Default for AnalysisCfg {
    fn default() -> Self {
        Self {
            moving_threshold_deg: 1.0,
            strata_divisor: 4,
        }
    }
}

/// A named stability-gate setup, one per calibration procedure.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PresetCfg {
    #[serde(deserialize_with = "de_channels")]
    pub channels: Vec<Channel>,
    /// Minimum accuracy level every channel must report (0..=3).
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// How long all channels must stay at/above threshold.
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    /// Polling period for live sources.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    /// Give up after this long; 0 waits forever.
    #[serde(default)]
    pub deadline_ms: u64,
}

fn default_threshold() -> u8 {
    2
}

fn default_hold_ms() -> u64 {
    5_000
}

fn default_poll_ms() -> u64 {
    200
}

impl PresetCfg {
    fn builtin(channels: &[Channel], hold_ms: u64, poll_ms: u64, deadline_ms: u64) -> Self {
        Self {
            channels: channels.to_vec(),
            threshold: default_threshold(),
            hold_ms,
            poll_ms,
            deadline_ms,
        }
    }
}

/// Presets matching the bench procedures: whole-assembly calibration,
/// single-sensor calibrations, and the magnetometer readiness check before tare.
pub fn builtin_presets() -> BTreeMap<String, PresetCfg> {
    use Channel::{Accelerometer, Gyroscope, Magnetometer};
    let mut m = BTreeMap::new();
    m.insert(
        "assembly".to_string(),
        PresetCfg::builtin(&[Accelerometer, Gyroscope, Magnetometer], 5_000, 200, 0),
    );
    m.insert(
        "accel".to_string(),
        PresetCfg::builtin(&[Accelerometer], 5_000, 200, 0),
    );
    m.insert(
        "gyro".to_string(),
        PresetCfg::builtin(&[Gyroscope], 5_000, 200, 0),
    );
    m.insert(
        "mag".to_string(),
        PresetCfg::builtin(&[Magnetometer], 5_000, 200, 0),
    );
    m.insert(
        "tare".to_string(),
        PresetCfg::builtin(&[Magnetometer], 0, 500, 30_000),
    );
    m
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub encoder: EncoderCfg,
    pub analysis: AnalysisCfg,
    /// Named stability presets; merged over the built-in set.
    pub stability: BTreeMap<String, PresetCfg>,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn de_channels<'de, D>(deserializer: D) -> Result<Vec<Channel>, D::Error>
where
    D: Deserializer<'de>,
{
    let names: Vec<String> = Vec::deserialize(deserializer)?;
    names
        .iter()
        .map(|n| n.parse::<Channel>().map_err(serde::de::Error::custom))
        .collect()
}

impl Config {
    /// Built-in presets with any configured presets layered on top.
    pub fn presets(&self) -> BTreeMap<String, PresetCfg> {
        let mut all = builtin_presets();
        for (name, p) in &self.stability {
            all.insert(name.clone(), p.clone());
        }
        all
    }

    pub fn preset(&self, name: &str) -> eyre::Result<PresetCfg> {
        self.presets().remove(name).ok_or_else(|| {
            let known: Vec<String> = self.presets().into_keys().collect();
            eyre::eyre!(
                "unknown stability preset '{name}' (known: {})",
                known.join(", ")
            )
        })
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Encoder
        if !(0..ENCODER_STEPS).contains(&self.encoder.axis_center) {
            eyre::bail!("encoder.axis_center must be in [0, 4095]");
        }

        // Analysis
        if !(self.analysis.moving_threshold_deg.is_finite()
            && self.analysis.moving_threshold_deg > 0.0)
        {
            eyre::bail!("analysis.moving_threshold_deg must be > 0");
        }
        if self.analysis.strata_divisor < 2 {
            eyre::bail!("analysis.strata_divisor must be >= 2");
        }

        // Stability presets
        for (name, p) in &self.stability {
            if p.channels.is_empty() {
                eyre::bail!("stability.{name}.channels must not be empty");
            }
            for (i, ch) in p.channels.iter().enumerate() {
                if p.channels[..i].contains(ch) {
                    eyre::bail!("stability.{name}.channels lists '{ch}' twice");
                }
            }
            if p.threshold > 3 {
                eyre::bail!("stability.{name}.threshold must be in [0, 3]");
            }
            if p.poll_ms == 0 {
                eyre::bail!("stability.{name}.poll_ms must be >= 1");
            }
            if p.hold_ms > 60 * 60 * 1000 {
                eyre::bail!("stability.{name}.hold_ms is unreasonably large (>1h)");
            }
            if p.deadline_ms != 0 && p.deadline_ms < p.hold_ms {
                eyre::bail!("stability.{name}.deadline_ms must be 0 or >= hold_ms");
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
