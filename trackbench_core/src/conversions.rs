//! Bridges from `trackbench_config` types to `trackbench_core` types.

use std::time::Duration;

use trackbench_config::{AnalysisCfg, PresetCfg, SampleRow};

use crate::config::{MetricsCfg, SessionCfg, StabilityCfg};
use crate::dataset::{Dataset, Sample};
use crate::error::{AnalysisError, BuildError};

// ── MetricsCfg ───────────────────────────────────────────────────────────────

impl From<&AnalysisCfg> for MetricsCfg {
    fn from(c: &AnalysisCfg) -> Self {
        Self {
            moving_threshold_deg: c.moving_threshold_deg,
            strata_divisor: c.strata_divisor,
        }
    }
}

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl TryFrom<&PresetCfg> for SessionCfg {
    type Error = BuildError;

    fn try_from(p: &PresetCfg) -> Result<Self, Self::Error> {
        let stability = StabilityCfg::new(
            p.channels.clone(),
            p.threshold,
            Duration::from_millis(p.hold_ms),
        )?;
        let deadline = (p.deadline_ms > 0).then(|| Duration::from_millis(p.deadline_ms));
        Self::new(stability, Duration::from_millis(p.poll_ms), deadline)
    }
}

// ── Sample ───────────────────────────────────────────────────────────────────

impl From<&SampleRow> for Sample {
    fn from(r: &SampleRow) -> Self {
        Self::new(r.time_ms, r.enc_deg, r.imu_deg, r.lag_ms)
    }
}

/// Build a validated dataset straight from ingested rows.
pub fn dataset_from_rows(
    label: impl Into<String>,
    rows: &[SampleRow],
) -> Result<Dataset, AnalysisError> {
    Dataset::new(label, rows.iter().map(Sample::from).collect())
}
