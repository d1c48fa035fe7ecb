//! Live calibration session: poll accuracy until stable, then save once.
//!
//! Ties a [`LevelPoller`] to a [`DeadlineGate`]. The save action runs exactly
//! once, on the tick that reaches `Stable`; a timeout or cancellation never
//! saves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use trackbench_traits::clock::Clock;
use trackbench_traits::{AccuracySource, CalibrationStore, Channel};

use crate::config::SessionCfg;
use crate::error::{Result, SessionError};
use crate::gate::{DeadlineGate, GateOutcome};
use crate::poller::LevelPoller;
use crate::stability::{StabilityMonitor, StabilityState};
use crate::util::duration_ms;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Converged and the store accepted the save.
    Saved { after: Duration },
    /// Deadline passed; `lagging` is the channel that held things up.
    TimedOut { lagging: Option<Channel> },
    /// The shutdown flag was raised.
    Cancelled,
}

/// Run one calibration session to completion.
///
/// `shutdown` is checked between readings; raising it ends the session as
/// `Cancelled` without saving.
pub fn run_calibration<S, K, C>(
    source: S,
    store: &mut K,
    cfg: &SessionCfg,
    clock: C,
    shutdown: Arc<AtomicBool>,
) -> Result<SessionOutcome>
where
    S: AccuracySource + Send + 'static,
    K: CalibrationStore + ?Sized,
    C: Clock + Clone + Send + Sync + 'static,
{
    let epoch = clock.now();
    let monitor = StabilityMonitor::with_clock(cfg.stability.clone(), Arc::new(clock.clone()));
    let mut gate = DeadlineGate::new(monitor, cfg.deadline);
    gate.start_at(0);
    let poller = LevelPoller::spawn(
        source,
        cfg.stability.channels().to_vec(),
        cfg.poll,
        clock.clone(),
    );
    let wait = cfg.poll.saturating_mul(2);
    let mut last_state = StabilityState::Unstable;

    tracing::info!(
        channels = ?cfg.stability.channels(),
        threshold = cfg.stability.threshold(),
        hold_ms = duration_ms(cfg.stability.hold()),
        "calibration session start"
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("calibration session cancelled");
            return Ok(SessionOutcome::Cancelled);
        }

        let outcome = match poller.recv_timeout(wait) {
            Some(reading) => gate.poll_at(reading.at_ms, &reading.levels),
            None => match gate.expire_at(clock.ms_since(epoch)) {
                Some(done) => done,
                None => continue,
            },
        };

        match outcome {
            GateOutcome::Pending(state) => {
                if state.name() != last_state.name() {
                    tracing::info!(
                        state = state.name(),
                        remaining_ms = duration_ms(gate.monitor().remaining()),
                        hint = ?gate.monitor().hint(),
                        "stability changed"
                    );
                }
                last_state = state;
            }
            GateOutcome::Stable => {
                store
                    .save()
                    .map_err(|e| eyre::Report::new(SessionError::Save(e.to_string())))?;
                let after = Duration::from_millis(clock.ms_since(epoch));
                tracing::info!(after_ms = duration_ms(after), "calibration saved");
                return Ok(SessionOutcome::Saved { after });
            }
            GateOutcome::TimedOut => {
                return Ok(SessionOutcome::TimedOut {
                    lagging: gate.monitor().lagging_channel(),
                });
            }
        }
    }
}
