//! Synchronized reference/measured samples.

use crate::error::AnalysisError;

/// One synchronized observation of both sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Monotonic milliseconds since the run started.
    pub time_ms: u64,
    /// Encoder angle (ground truth), degrees.
    pub reference_deg: f64,
    /// IMU angle under test, degrees.
    pub measured_deg: f64,
    /// Staleness of the IMU report when it was consumed, ms.
    pub latency_ms: f64,
}

impl Sample {
    pub fn new(time_ms: u64, reference_deg: f64, measured_deg: f64, latency_ms: f64) -> Self {
        Self {
            time_ms,
            reference_deg,
            measured_deg,
            latency_ms,
        }
    }

    /// `reference - measured`, deliberately not wrap-folded.
    #[inline]
    pub fn error_deg(&self) -> f64 {
        self.reference_deg - self.measured_deg
    }
}

/// A labelled, time-ordered run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    label: String,
    samples: Vec<Sample>,
}

impl Dataset {
    /// Build a dataset, rejecting out-of-order timestamps and non-finite values.
    ///
    /// Short datasets are accepted here; analysis reports them as insufficient.
    pub fn new(label: impl Into<String>, samples: Vec<Sample>) -> Result<Self, AnalysisError> {
        for (index, s) in samples.iter().enumerate() {
            for (field, v) in [
                ("reference angle", s.reference_deg),
                ("measured angle", s.measured_deg),
                ("latency", s.latency_ms),
            ] {
                if !v.is_finite() {
                    return Err(AnalysisError::NonFinite { index, field });
                }
            }
            if index > 0 {
                let prev_ms = samples[index - 1].time_ms;
                if s.time_ms < prev_ms {
                    return Err(AnalysisError::NonMonotonicTime {
                        index,
                        prev_ms,
                        time_ms: s.time_ms,
                    });
                }
            }
        }
        Ok(Self {
            label: label.into(),
            samples,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
