//! Convergence debounce for calibration accuracy levels.
//!
//! Each monitored channel reports a small ordinal accuracy level. The monitor
//! raises `Stable` only once every channel has been at or above the threshold
//! continuously for the hold duration. Any violation discards the hold timer
//! (full reset, no decay). Each tick is judged on its own reading: a
//! monitored channel missing from it counts as below threshold, whatever it
//! reported earlier.
//!
//! ```text
//!            all >= threshold                 now - since >= hold
//! Unstable ------------------> Converging(since) -----------------> Stable
//!    ^                               |
//!    +------- any < threshold -------+
//! ```
//!
//! `Stable` is terminal. Time comes from a monotonic [`Clock`] (or an
//! explicit monotonic millisecond stamp via [`StabilityMonitor::poll_at`]);
//! wall-clock time is never consulted.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use trackbench_traits::Channel;
use trackbench_traits::clock::{Clock, MonotonicClock};

use crate::config::StabilityCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityState {
    Unstable,
    /// All channels good since `since_ms` (monitor-relative milliseconds).
    Converging {
        since_ms: u64,
    },
    Stable,
}

impl StabilityState {
    pub fn name(&self) -> &'static str {
        match self {
            StabilityState::Unstable => "unstable",
            StabilityState::Converging { .. } => "converging",
            StabilityState::Stable => "stable",
        }
    }
}

/// Priority for operator hints: the magnetometer is the slowest to converge,
/// then the gyroscope needs stillness, then accelerometer faces.
const HINT_ORDER: [Channel; 3] = [
    Channel::Magnetometer,
    Channel::Gyroscope,
    Channel::Accelerometer,
];

pub struct StabilityMonitor {
    cfg: StabilityCfg,
    hold_ms: u64,
    state: StabilityState,
    levels: BTreeMap<Channel, u8>,
    reading: BTreeMap<Channel, u8>,
    last_tick_ms: u64,
    stable_edge: bool,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
}

impl core::fmt::Debug for StabilityMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StabilityMonitor")
            .field("state", &self.state)
            .field("threshold", &self.cfg.threshold())
            .field("hold_ms", &self.hold_ms)
            .field("levels", &self.levels)
            .finish()
    }
}

impl StabilityMonitor {
    /// Monitor driven by the real monotonic clock.
    pub fn new(cfg: StabilityCfg) -> Self {
        Self::with_clock(cfg, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(cfg: StabilityCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        let hold_ms = cfg.hold_ms();
        Self {
            cfg,
            hold_ms,
            state: StabilityState::Unstable,
            levels: BTreeMap::new(),
            reading: BTreeMap::new(),
            last_tick_ms: 0,
            stable_edge: false,
            clock,
            epoch,
        }
    }

    pub fn cfg(&self) -> &StabilityCfg {
        &self.cfg
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    /// Last reported level per channel (unmonitored channels included).
    pub fn levels(&self) -> &BTreeMap<Channel, u8> {
        &self.levels
    }

    /// Milliseconds since this monitor was created, per its clock.
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// One polling tick using the monitor's clock.
    pub fn poll(&mut self, levels: &[(Channel, u8)]) -> StabilityState {
        let now_ms = self.elapsed_ms();
        self.poll_at(now_ms, levels)
    }

    /// One polling tick at an explicit monotonic timestamp.
    ///
    /// A stamp earlier than a previous tick is treated as that previous tick,
    /// so a misbehaving time source can delay stability but never fake it.
    pub fn poll_at(&mut self, now_ms: u64, levels: &[(Channel, u8)]) -> StabilityState {
        self.stable_edge = false;
        if self.state == StabilityState::Stable {
            return self.state;
        }
        let now_ms = now_ms.max(self.last_tick_ms);
        self.last_tick_ms = now_ms;
        self.reading.clear();
        for &(ch, level) in levels {
            self.reading.insert(ch, level);
            self.levels.insert(ch, level);
        }

        if let Some(ch) = self.lagging_channel() {
            if let StabilityState::Converging { since_ms } = self.state {
                tracing::warn!(
                    channel = %ch,
                    level = self.reading.get(&ch).copied(),
                    held_ms = now_ms - since_ms,
                    "lost stability, resetting hold timer"
                );
            }
            self.state = StabilityState::Unstable;
            return self.state;
        }

        let since_ms = match self.state {
            StabilityState::Converging { since_ms } => since_ms,
            _ => {
                tracing::debug!(
                    threshold = self.cfg.threshold(),
                    hold_ms = self.hold_ms,
                    "all channels at threshold, holding"
                );
                now_ms
            }
        };
        self.state = if now_ms - since_ms >= self.hold_ms {
            tracing::info!(held_ms = now_ms - since_ms, "stable");
            self.stable_edge = true;
            StabilityState::Stable
        } else {
            StabilityState::Converging { since_ms }
        };
        self.state
    }

    /// True only right after the tick that entered `Stable`.
    pub fn became_stable(&self) -> bool {
        self.stable_edge
    }

    pub fn is_stable(&self) -> bool {
        self.state == StabilityState::Stable
    }

    /// Hold time still required, measured at the last tick.
    ///
    /// The full hold while unstable, zero once stable.
    pub fn remaining(&self) -> Duration {
        let ms = match self.state {
            StabilityState::Unstable => self.hold_ms,
            StabilityState::Converging { since_ms } => self
                .hold_ms
                .saturating_sub(self.last_tick_ms.saturating_sub(since_ms)),
            StabilityState::Stable => 0,
        };
        Duration::from_millis(ms)
    }

    /// The monitored channel most in need of attention in the last reading.
    /// A channel absent from that reading counts as below threshold.
    pub fn lagging_channel(&self) -> Option<Channel> {
        let threshold = self.cfg.threshold();
        HINT_ORDER
            .into_iter()
            .filter(|ch| self.cfg.channels().contains(ch))
            .find(|ch| self.reading.get(ch).is_none_or(|&l| l < threshold))
    }

    /// Operator guidance for the lagging channel.
    pub fn hint(&self) -> Option<&'static str> {
        self.lagging_channel().map(Channel::operator_hint)
    }
}
