//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "trackbench", version, about = "IMU-vs-encoder tracking bench")]
pub struct Cli {
    /// Path to config TOML (built-in defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON, and log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tracking metrics for one run, or two runs side by side
    Analyse {
        /// Sample log (T,ENC,IMU,Lag)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Second sample log to compare against the first
        #[arg(value_name = "FILE2")]
        other: Option<PathBuf>,
    },
    /// Convert a raw encoder step to signed degrees
    Degrees {
        /// Raw encoder step (0..4095)
        #[arg(long, allow_hyphen_values = true)]
        raw: i32,
        /// Axis center step; defaults to encoder.axis_center from config
        #[arg(long, allow_hyphen_values = true)]
        center: Option<i32>,
    },
    /// Replay an accuracy-level log through a stability preset
    Stability {
        /// Level log (T plus any of accel,gyro,mag)
        #[arg(long, value_name = "FILE")]
        levels: PathBuf,
        /// Stability preset name
        #[arg(long, default_value = "assembly")]
        preset: String,
    },
    /// List the effective stability presets
    Presets,
    /// Run a live calibration session against the simulated IMU
    Calibrate {
        /// Stability preset name
        #[arg(long, default_value = "assembly")]
        preset: String,
        /// Simulated time per accuracy level (magnetometer takes twice as long)
        #[arg(long, value_name = "MS", default_value_t = 1_000)]
        ramp_ms: u64,
        /// Write a calibration record here when the session saves
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
}
