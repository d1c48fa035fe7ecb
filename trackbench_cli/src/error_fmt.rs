//! Human-readable error descriptions, exit codes and structured JSON errors.

use trackbench_config::IngestError;
use trackbench_core::{AnalysisError, BuildError, SessionError};

/// Outcomes that end a command unsuccessfully without being faults.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("preset '{preset}' did not stabilise: {detail}")]
    NotStable { preset: String, detail: String },
    #[error("calibration cancelled")]
    Cancelled,
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::InsufficientData { label, samples } => format!(
                "What happened: '{label}' has {samples} sample(s); at least 2 are needed.\nLikely causes: The capture stopped immediately or the log only has a header.\nHow to fix: Record a longer run and analyse again."
            ),
            AnalysisError::NonMonotonicTime {
                index,
                prev_ms,
                time_ms,
            } => format!(
                "What happened: Sample {index} is at {time_ms} ms, before the previous sample at {prev_ms} ms.\nLikely causes: Two captures were concatenated or the logger clock was reset.\nHow to fix: Split the log into separate runs."
            ),
            AnalysisError::NonFinite { index, field } => format!(
                "What happened: Sample {index} has a non-finite {field}.\nLikely causes: The sensor reported NaN or the logger wrote a placeholder.\nHow to fix: Drop the affected rows and analyse again."
            ),
        };
    }

    if let Some(ie) = err.downcast_ref::<IngestError>() {
        return match ie {
            IngestError::InvalidRecord { row, reason } => format!(
                "What happened: Invalid record at line {row} ({reason}).\nLikely causes: A truncated write or a non-numeric value in the log.\nHow to fix: Fix or remove that line; values are never defaulted."
            ),
            IngestError::MissingColumn { column } => format!(
                "What happened: The CSV has no '{column}' column.\nLikely causes: Wrong file, or a header written by an older logger.\nHow to fix: Sample logs need T,ENC,IMU,Lag; level logs need T plus accel, gyro or mag."
            ),
            IngestError::Open { path, source } => format!(
                "What happened: Could not open {}.\nLikely causes: {source}.\nHow to fix: Check the path and permissions.",
                path.display()
            ),
            IngestError::Header(source) => format!(
                "What happened: Could not read the CSV header ({source}).\nLikely causes: Empty or non-UTF-8 file.\nHow to fix: Check the file contents."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::NotStable { preset, detail } => format!(
                "What happened: Preset '{preset}' never became stable ({detail}).\nLikely causes: A sensor stayed below threshold or the hold was interrupted.\nHow to fix: Follow the operator hint and retry, or relax the preset's threshold or hold_ms."
            ),
            CliError::Cancelled => "Calibration cancelled; nothing was saved.".to_string(),
        };
    }

    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::Save(msg) => format!(
                "What happened: The sensor converged but saving the calibration failed ({msg}).\nLikely causes: Storage is unavailable or read-only.\nHow to fix: Check the --save path and retry the session."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid stability preset ({be}).\nLikely causes: Empty or repeated channels, or a zero poll interval.\nHow to fix: Edit the [stability.*] table in the config, then rerun."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("unknown stability preset") {
        return format!("{msg}\nHow to fix: Run `trackbench presets` to list the available names.");
    }

    if lower.contains("must be") || lower.contains("parse config") {
        let mut detail = msg.clone();
        if let Some(src) = err.source() {
            detail = format!("{msg}: {src}");
        }
        return format!(
            "What happened: Configuration is invalid ({detail}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure class; anything unclassified is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::InsufficientData { .. } => 3,
            AnalysisError::NonMonotonicTime { .. } | AnalysisError::NonFinite { .. } => 4,
        };
    }
    if let Some(IngestError::InvalidRecord { .. } | IngestError::MissingColumn { .. }) =
        err.downcast_ref::<IngestError>()
    {
        return 4;
    }
    match err.downcast_ref::<CliError>() {
        Some(CliError::NotStable { .. }) => 5,
        Some(CliError::Cancelled) => 130,
        None => 1,
    }
}

/// Stable machine name for the failure class.
fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        3 => "InsufficientData",
        4 => "InvalidRecord",
        5 => "NotStable",
        130 => "Cancelled",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({ "reason": reason_name(err), "message": humanize(err) });
    if let Some(IngestError::InvalidRecord { row, .. }) = err.downcast_ref::<IngestError>() {
        obj["details"] = json!({ "line": row });
    } else if let Some(AnalysisError::InsufficientData { label, samples }) =
        err.downcast_ref::<AnalysisError>()
    {
        obj["details"] = json!({ "label": label, "samples": samples });
    }
    obj.to_string()
}
