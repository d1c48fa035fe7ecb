//! Offline replay of a logged accuracy run through the stability gate.

use std::time::Duration;

use trackbench_config::LevelRow;
use trackbench_traits::Channel;

use crate::config::SessionCfg;
use crate::gate::{DeadlineGate, GateOutcome};
use crate::stability::{StabilityMonitor, StabilityState};

/// A state change observed during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub at_ms: u64,
    pub from: StabilityState,
    pub to: StabilityState,
    /// Channel below threshold after the tick, if any.
    pub lagging: Option<Channel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    Stable { at_ms: u64 },
    TimedOut { at_ms: u64 },
    /// The log ended first; `remaining` is the hold time still owed.
    Incomplete { remaining: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ticks: usize,
    pub transitions: Vec<Transition>,
    pub outcome: ReplayOutcome,
}

/// Feed each row to a fresh gate at the row's own timestamp, stopping at the
/// first terminal outcome.
pub fn replay_levels(rows: &[LevelRow], cfg: &SessionCfg) -> ReplaySummary {
    let monitor = StabilityMonitor::new(cfg.stability.clone());
    let mut gate = DeadlineGate::new(monitor, cfg.deadline);
    let mut transitions = Vec::new();
    let mut prev = StabilityState::Unstable;
    let mut ticks = 0usize;

    for row in rows {
        ticks += 1;
        let outcome = gate.poll_at(row.time_ms, &row.levels);
        let state = gate.monitor().state();
        if state.name() != prev.name() {
            transitions.push(Transition {
                at_ms: row.time_ms,
                from: prev,
                to: state,
                lagging: gate.monitor().lagging_channel(),
            });
        }
        prev = state;
        match outcome {
            GateOutcome::Stable => {
                return ReplaySummary {
                    ticks,
                    transitions,
                    outcome: ReplayOutcome::Stable { at_ms: row.time_ms },
                };
            }
            GateOutcome::TimedOut => {
                return ReplaySummary {
                    ticks,
                    transitions,
                    outcome: ReplayOutcome::TimedOut { at_ms: row.time_ms },
                };
            }
            GateOutcome::Pending(_) => {}
        }
    }

    ReplaySummary {
        ticks,
        transitions,
        outcome: ReplayOutcome::Incomplete {
            remaining: gate.monitor().remaining(),
        },
    }
}
