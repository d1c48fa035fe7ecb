#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Tracking-bench engine (hardware-agnostic).
//!
//! Accuracy levels come in through `trackbench_traits::AccuracySource`, and
//! calibration is persisted through `trackbench_traits::CalibrationStore`.
//!
//! ## Architecture
//!
//! - **Angles**: raw 12-bit encoder steps to signed degrees (`angle`)
//! - **Datasets**: validated, time-ordered encoder/IMU runs (`dataset`)
//! - **Metrics**: sample rate, latency, error, correlation, trailing (`metrics`)
//! - **Reports**: single and side-by-side rendering (`report`)
//! - **Stability**: convergence debounce over accuracy levels (`stability`),
//!   with an optional deadline (`gate`)
//! - **Sessions**: live polling thread plus save-once (`poller`, `session`),
//!   and offline replay of logged levels (`replay`)
//!
//! Everything except the poller is single-threaded and clock-free or driven by
//! an injected `Clock`, so runs are reproducible in tests.

pub mod angle;
pub mod config;
pub mod conversions;
pub mod dataset;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod mocks;
pub mod poller;
pub mod replay;
pub mod report;
pub mod session;
pub mod stability;
pub mod util;

pub use angle::{AxisFrame, to_degrees, wrap_error};
pub use config::{MetricsCfg, SessionCfg, StabilityCfg};
pub use conversions::dataset_from_rows;
pub use dataset::{Dataset, Sample};
pub use error::{AnalysisError, BuildError, Result, SessionError};
pub use gate::{DeadlineGate, GateOutcome};
pub use metrics::{METRIC_KEYS, MetricsReport, compute, compute_with};
pub use poller::{LevelPoller, LevelsReading};
pub use replay::{ReplayOutcome, ReplaySummary, Transition, replay_levels};
pub use report::{Comparison, ComparisonRow, LabelledReport, render_comparison, render_single};
pub use session::{SessionOutcome, run_calibration};
pub use stability::{StabilityMonitor, StabilityState};

/// Analyse one dataset.
pub fn analyse(
    dataset: &Dataset,
    cfg: &MetricsCfg,
) -> std::result::Result<LabelledReport, AnalysisError> {
    Ok(LabelledReport::new(dataset.label(), compute_with(dataset, cfg)?))
}

/// Analyse two datasets independently and pair the reports.
///
/// Fails on the first dataset that cannot be analysed.
pub fn compare(
    a: &Dataset,
    b: &Dataset,
    cfg: &MetricsCfg,
) -> std::result::Result<Comparison, AnalysisError> {
    Ok(Comparison::new(analyse(a, cfg)?, analyse(b, cfg)?))
}
