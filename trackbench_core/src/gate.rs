//! Caller-side give-up policy around a [`StabilityMonitor`].
//!
//! The monitor itself waits forever; a gate adds an optional deadline counted
//! from the first tick, checked after each poll so a tick that reaches
//! stability exactly at the deadline still counts as stable.

use std::time::Duration;

use trackbench_traits::Channel;

use crate::stability::{StabilityMonitor, StabilityState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Keep polling.
    Pending(StabilityState),
    /// Converged on this tick.
    Stable,
    /// Deadline passed without converging.
    TimedOut,
}

#[derive(Debug)]
pub struct DeadlineGate {
    monitor: StabilityMonitor,
    deadline_ms: Option<u64>,
    started_ms: Option<u64>,
    finished: Option<GateOutcome>,
}

impl DeadlineGate {
    pub fn new(monitor: StabilityMonitor, deadline: Option<Duration>) -> Self {
        Self {
            monitor,
            deadline_ms: deadline.map(crate::util::duration_ms),
            started_ms: None,
            finished: None,
        }
    }

    pub fn monitor(&self) -> &StabilityMonitor {
        &self.monitor
    }

    /// Poll using the monitor's clock.
    pub fn poll(&mut self, levels: &[(Channel, u8)]) -> GateOutcome {
        let now_ms = self.monitor.elapsed_ms();
        self.poll_at(now_ms, levels)
    }

    /// Poll at an explicit monotonic timestamp. After `Stable` or `TimedOut`
    /// the same outcome is returned without touching the monitor.
    pub fn poll_at(&mut self, now_ms: u64, levels: &[(Channel, u8)]) -> GateOutcome {
        if let Some(done) = self.finished {
            return done;
        }
        let started = *self.started_ms.get_or_insert(now_ms);
        let state = self.monitor.poll_at(now_ms, levels);
        if state == StabilityState::Stable {
            self.finished = Some(GateOutcome::Stable);
            return GateOutcome::Stable;
        }
        if let Some(limit) = self.deadline_ms
            && now_ms.saturating_sub(started) >= limit
        {
            tracing::warn!(
                deadline_ms = limit,
                lagging = ?self.monitor.lagging_channel(),
                "gave up waiting for stability"
            );
            self.finished = Some(GateOutcome::TimedOut);
            return GateOutcome::TimedOut;
        }
        GateOutcome::Pending(state)
    }

    /// Start the deadline countdown at `now_ms` instead of at the first poll.
    pub fn start_at(&mut self, now_ms: u64) {
        self.started_ms.get_or_insert(now_ms);
    }

    /// Ends the gate as `TimedOut` if the deadline has passed at `now_ms`
    /// without any new reading. Returns the finished outcome, if any.
    pub fn expire_at(&mut self, now_ms: u64) -> Option<GateOutcome> {
        if self.finished.is_none()
            && let (Some(limit), Some(started)) = (self.deadline_ms, self.started_ms)
            && now_ms.saturating_sub(started) >= limit
        {
            tracing::warn!(deadline_ms = limit, "gave up waiting for stability (no readings)");
            self.finished = Some(GateOutcome::TimedOut);
        }
        self.finished
    }

    /// Time left before the deadline at `now_ms`; `None` without a deadline.
    pub fn remaining(&self, now_ms: u64) -> Option<Duration> {
        let limit = self.deadline_ms?;
        let used = self
            .started_ms
            .map_or(0, |s| now_ms.saturating_sub(s));
        Some(Duration::from_millis(limit.saturating_sub(used)))
    }

    pub fn into_monitor(self) -> StabilityMonitor {
        self.monitor
    }
}
