use thiserror::Error;

/// Failures turning logged samples into a report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data in '{label}': {samples} sample(s), need at least 2")]
    InsufficientData { label: String, samples: usize },
    #[error("sample {index} goes back in time ({time_ms} ms after {prev_ms} ms)")]
    NonMonotonicTime {
        index: usize,
        prev_ms: u64,
        time_ms: u64,
    },
    #[error("sample {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("stability gate needs at least one channel")]
    NoChannels,
    #[error("channel '{0}' listed twice")]
    DuplicateChannel(trackbench_traits::Channel),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Failures of a live calibration session (not of the gate itself, which never fails).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("saving calibration failed: {0}")]
    Save(String),
}
