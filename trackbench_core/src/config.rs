//! Runtime configuration types for the analysis engine and stability gate.
//!
//! These are separate from the TOML-deserialized config in `trackbench_config`;
//! see `conversions` for the bridges.

use std::time::Duration;

use trackbench_traits::Channel;

use crate::error::BuildError;

/// Metrics engine knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsCfg {
    /// Reference moves at or below this (degrees per interval) are treated as
    /// stationary and excluded from the trailing classification.
    pub moving_threshold_deg: f64,
    /// Each velocity stratum holds `intervals / strata_divisor` intervals (4 = quartiles).
    pub strata_divisor: usize,
}

impl Default for MetricsCfg {
    fn default() -> Self {
        Self {
            moving_threshold_deg: 1.0,
            strata_divisor: 4,
        }
    }
}

/// Parameters of one convergence gate: which channels, how good, how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityCfg {
    channels: Vec<Channel>,
    threshold: u8,
    hold: Duration,
}

impl StabilityCfg {
    pub fn new(
        channels: Vec<Channel>,
        threshold: u8,
        hold: Duration,
    ) -> Result<Self, BuildError> {
        if channels.is_empty() {
            return Err(BuildError::NoChannels);
        }
        for (i, ch) in channels.iter().enumerate() {
            if channels[..i].contains(ch) {
                return Err(BuildError::DuplicateChannel(*ch));
            }
        }
        Ok(Self {
            channels,
            threshold,
            hold,
        })
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    pub(crate) fn hold_ms(&self) -> u64 {
        crate::util::duration_ms(self.hold)
    }
}

/// A stability gate plus the polling and give-up policy of a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCfg {
    pub stability: StabilityCfg,
    /// Interval between level reads.
    pub poll: Duration,
    /// Give up when not stable after this long; `None` waits forever.
    pub deadline: Option<Duration>,
}

impl SessionCfg {
    pub fn new(
        stability: StabilityCfg,
        poll: Duration,
        deadline: Option<Duration>,
    ) -> Result<Self, BuildError> {
        if poll.is_zero() {
            return Err(BuildError::InvalidConfig("poll interval must be > 0"));
        }
        Ok(Self {
            stability,
            poll,
            deadline,
        })
    }
}
