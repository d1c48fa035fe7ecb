//! Offline replay of logged accuracy levels.

use std::time::Duration;

use trackbench_config::{LevelRow, read_levels_csv};
use trackbench_core::{
    ReplayOutcome, SessionCfg, StabilityCfg, StabilityState, Transition, replay_levels,
};
use trackbench_traits::Channel::{Accelerometer as A, Gyroscope as G, Magnetometer as M};

fn cfg(deadline_ms: Option<u64>) -> SessionCfg {
    let stability = StabilityCfg::new(vec![A, G, M], 2, Duration::from_secs(5)).expect("cfg");
    SessionCfg::new(
        stability,
        Duration::from_millis(200),
        deadline_ms.map(Duration::from_millis),
    )
    .expect("session cfg")
}

fn rows(csv: &str) -> Vec<LevelRow> {
    read_levels_csv(csv.as_bytes()).expect("valid level log")
}

#[test]
fn logged_run_converges_after_reset() {
    let log = rows(
        "T,accel,gyro,mag\n\
         0,1,1,1\n\
         1000,2,2,2\n\
         4000,2,2,2\n\
         4500,1,2,2\n\
         5000,2,2,2\n\
         9000,3,2,2\n\
         10000,2,2,2\n\
         11000,2,2,2\n",
    );
    let summary = replay_levels(&log, &cfg(None));

    assert_eq!(summary.outcome, ReplayOutcome::Stable { at_ms: 10_000 });
    assert_eq!(summary.ticks, 7);
    let states: Vec<(u64, &str)> = summary
        .transitions
        .iter()
        .map(|t| (t.at_ms, t.to.name()))
        .collect();
    assert_eq!(
        states,
        vec![
            (1000, "converging"),
            (4500, "unstable"),
            (5000, "converging"),
            (10000, "stable"),
        ]
    );
    assert_eq!(
        summary.transitions[1],
        Transition {
            at_ms: 4500,
            from: StabilityState::Converging { since_ms: 1000 },
            to: StabilityState::Unstable,
            lagging: Some(A),
        }
    );
}

#[test]
fn truncated_log_reports_remaining_hold() {
    let log = rows("T,accel,gyro,mag\n0,2,2,2\n3000,3,3,3\n");
    let summary = replay_levels(&log, &cfg(None));
    assert_eq!(
        summary.outcome,
        ReplayOutcome::Incomplete {
            remaining: Duration::from_secs(2)
        }
    );
}

#[test]
fn deadline_applies_from_first_row() {
    let log = rows("T,accel,gyro,mag\n1000,0,0,0\n2000,3,3,3\n3500,3,3,3\n");
    let summary = replay_levels(&log, &cfg(Some(2_500)));
    assert_eq!(summary.outcome, ReplayOutcome::TimedOut { at_ms: 3500 });
}

#[test]
fn missing_channel_column_never_converges() {
    let log = rows("T,accel,gyro\n0,3,3\n10000,3,3\n");
    let summary = replay_levels(&log, &cfg(None));
    assert!(summary.transitions.is_empty());
    assert_eq!(
        summary.outcome,
        ReplayOutcome::Incomplete {
            remaining: Duration::from_secs(5)
        }
    );
}

#[test]
fn empty_log_is_incomplete() {
    let summary = replay_levels(&[], &cfg(None));
    assert_eq!(summary.ticks, 0);
    assert!(matches!(summary.outcome, ReplayOutcome::Incomplete { .. }));
}
