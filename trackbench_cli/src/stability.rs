//! `stability`, `presets` and `calibrate` commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use serde_json::json;
use trackbench_config::Config;
use trackbench_core::{ReplayOutcome, SessionCfg, SessionOutcome, replay_levels, run_calibration};
use trackbench_traits::clock::MonotonicClock;

use crate::error_fmt::CliError;
use crate::sim::{FileStore, SimulatedImu};

fn session_cfg(cfg: &Config, preset: &str) -> eyre::Result<SessionCfg> {
    let p = cfg.preset(preset)?;
    let session = SessionCfg::try_from(&p)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("stability preset '{preset}'"))?;
    Ok(session)
}

pub fn run_stability(cfg: &Config, levels: &Path, preset: &str, json: bool) -> eyre::Result<()> {
    let session = session_cfg(cfg, preset)?;
    let rows = trackbench_config::load_levels_csv(levels)?;
    let summary = replay_levels(&rows, &session);

    if json {
        let transitions: Vec<_> = summary
            .transitions
            .iter()
            .map(|t| {
                json!({
                    "at_ms": t.at_ms,
                    "from": t.from.name(),
                    "to": t.to.name(),
                    "lagging": t.lagging.map(|c| c.as_str()),
                })
            })
            .collect();
        let outcome = match summary.outcome {
            ReplayOutcome::Stable { at_ms } => json!({ "state": "stable", "at_ms": at_ms }),
            ReplayOutcome::TimedOut { at_ms } => json!({ "state": "timed_out", "at_ms": at_ms }),
            ReplayOutcome::Incomplete { remaining } => json!({
                "state": "incomplete",
                "remaining_ms": u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        println!(
            "{}",
            json!({
                "preset": preset,
                "ticks": summary.ticks,
                "transitions": transitions,
                "outcome": outcome,
            })
        );
    } else {
        println!("preset {preset}: {} readings", summary.ticks);
        for t in &summary.transitions {
            let hint = t.lagging.map_or(String::new(), |c| {
                format!("  [{c}: {}]", c.operator_hint())
            });
            println!(
                "  {:>8} ms  {} -> {}{hint}",
                t.at_ms,
                t.from.name(),
                t.to.name()
            );
        }
    }

    match summary.outcome {
        ReplayOutcome::Stable { at_ms } => {
            if !json {
                println!("stable at {at_ms} ms");
            }
            Ok(())
        }
        ReplayOutcome::TimedOut { at_ms } => Err(CliError::NotStable {
            preset: preset.to_string(),
            detail: format!("deadline passed at {at_ms} ms"),
        }
        .into()),
        ReplayOutcome::Incomplete { remaining } => Err(CliError::NotStable {
            preset: preset.to_string(),
            detail: format!("log ended {} ms short of the hold", remaining.as_millis()),
        }
        .into()),
    }
}

pub fn run_presets(cfg: &Config, json: bool) -> eyre::Result<()> {
    let presets = cfg.presets();
    if json {
        let obj: serde_json::Map<String, serde_json::Value> = presets
            .iter()
            .map(|(name, p)| {
                let channels: Vec<&str> = p.channels.iter().map(|c| c.as_str()).collect();
                (
                    name.clone(),
                    json!({
                        "channels": channels,
                        "threshold": p.threshold,
                        "hold_ms": p.hold_ms,
                        "poll_ms": p.poll_ms,
                        "deadline_ms": p.deadline_ms,
                    }),
                )
            })
            .collect();
        println!("{}", serde_json::Value::Object(obj));
        return Ok(());
    }
    println!(
        "{:<12} {:<16} {:>9} {:>8} {:>8} {:>11}",
        "preset", "channels", "threshold", "hold_ms", "poll_ms", "deadline_ms"
    );
    for (name, p) in &presets {
        let channels: Vec<&str> = p.channels.iter().map(|c| c.as_str()).collect();
        println!(
            "{:<12} {:<16} {:>9} {:>8} {:>8} {:>11}",
            name,
            channels.join(","),
            p.threshold,
            p.hold_ms,
            p.poll_ms,
            p.deadline_ms
        );
    }
    Ok(())
}

pub fn run_calibrate(
    cfg: &Config,
    preset: &str,
    ramp_ms: u64,
    save: Option<PathBuf>,
    json: bool,
) -> eyre::Result<()> {
    let session = session_cfg(cfg, preset)?;
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        // Only one handler per process; without it the deadline still ends the session.
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
    }

    let source = SimulatedImu::new(Duration::from_millis(ramp_ms));
    let mut store = FileStore::new(save, preset, session.stability.channels());
    let outcome = run_calibration(
        source,
        &mut store,
        &session,
        MonotonicClock::new(),
        shutdown,
    )?;

    match outcome {
        SessionOutcome::Saved { after } => {
            let after_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX);
            if json {
                println!(
                    "{}",
                    json!({ "preset": preset, "state": "saved", "after_ms": after_ms })
                );
            } else {
                println!("preset {preset}: stable, calibration saved after {after_ms} ms");
            }
            Ok(())
        }
        SessionOutcome::TimedOut { lagging } => Err(CliError::NotStable {
            preset: preset.to_string(),
            detail: lagging.map_or_else(
                || "deadline passed".to_string(),
                |c| format!("deadline passed, {c}: {}", c.operator_hint()),
            ),
        }
        .into()),
        SessionOutcome::Cancelled => Err(CliError::Cancelled.into()),
    }
}
