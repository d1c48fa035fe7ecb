//! Text rendering of one report or two reports side by side.
//!
//! Two runs are only ever juxtaposed: each report is computed from its own
//! dataset and nothing is resampled onto a shared clock.

use std::fmt::Write as _;

use crate::metrics::{METRIC_KEYS, MetricsReport};

/// A labelled report.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledReport {
    pub label: String,
    pub report: MetricsReport,
}

impl LabelledReport {
    pub fn new(label: impl Into<String>, report: MetricsReport) -> Self {
        Self {
            label: label.into(),
            report,
        }
    }
}

/// Two independently computed reports, one column per label.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub a: LabelledReport,
    pub b: LabelledReport,
}

/// One metric across both runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub key: &'static str,
    pub a: f64,
    pub b: f64,
}

impl Comparison {
    pub fn new(a: LabelledReport, b: LabelledReport) -> Self {
        Self { a, b }
    }

    /// Metric-keyed rows in `METRIC_KEYS` order.
    pub fn rows(&self) -> Vec<ComparisonRow> {
        self.a
            .report
            .entries()
            .into_iter()
            .zip(self.b.report.entries())
            .map(|((key, a), (_, b))| ComparisonRow { key, a, b })
            .collect()
    }

    pub fn row(&self, key: &str) -> Option<ComparisonRow> {
        self.rows().into_iter().find(|r| r.key == key)
    }
}

/// Display name and decimal places for each metric, grouped by section.
const SECTIONS: [(&str, &[(&str, &str, usize)]); 4] = [
    (
        "Sample Rate",
        &[
            ("n_samples", "Samples", 0),
            ("duration_s", "Duration (s)", 1),
            ("actual_hz", "Achieved Hz", 1),
            ("dt_mean_ms", "Mean dt (ms)", 1),
            ("dt_median_ms", "Median dt (ms)", 1),
        ],
    ),
    (
        "Lag (ms)",
        &[
            ("lag_mean", "Mean", 2),
            ("lag_median", "Median", 1),
            ("lag_min", "Min", 1),
            ("lag_max", "Max", 1),
            ("lag_std", "Std Dev", 2),
        ],
    ),
    (
        "Angle Error (deg)",
        &[
            ("mae", "MAE (overall)", 2),
            ("mae_fast", "MAE (fast motion)", 2),
            ("mae_slow", "MAE (slow motion)", 2),
            ("median_ae", "Median AE", 2),
            ("max_ae", "Max AE", 2),
            ("rms_error", "RMS Error", 2),
            ("bias", "Bias (ENC-IMU)", 2),
        ],
    ),
    (
        "Correlation & Tracking",
        &[
            ("correlation", "Pearson r", 4),
            ("trail_pct", "IMU trails motion (%)", 1),
            ("enc_range", "Encoder range (deg)", 1),
            ("imu_range", "IMU range (deg)", 1),
        ],
    ),
];

/// Key/value listing of a single report.
pub fn render_single(label: &str, report: &MetricsReport) -> String {
    let w = 50;
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(w));
    let _ = writeln!(out, "  {label}");
    let _ = writeln!(out, "{}", "-".repeat(w));
    for (key, value) in report.entries() {
        if key == "n_samples" {
            let _ = writeln!(out, "  {key:<32} {:>10}", report.n_samples);
        } else {
            let _ = writeln!(out, "  {key:<32} {value:>10.3}");
        }
    }
    let _ = writeln!(out, "{}", "=".repeat(w));
    out
}

/// Sectioned side-by-side table of two reports.
pub fn render_comparison(cmp: &Comparison) -> String {
    debug_assert_eq!(
        SECTIONS.iter().map(|(_, rows)| rows.len()).sum::<usize>(),
        METRIC_KEYS.len()
    );
    let w = 60;
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(w));
    let _ = writeln!(
        out,
        "  {:<32} {:>10}   {:>10}",
        "Metric", cmp.a.label, cmp.b.label
    );
    let _ = writeln!(out, "{}", "-".repeat(w));
    for (title, rows) in SECTIONS {
        let _ = writeln!(out, "\n  --- {title} ---");
        for &(key, name, prec) in rows {
            if let Some(r) = cmp.row(key) {
                let _ = writeln!(out, "  {name:<32} {:>10.prec$}   {:>10.prec$}", r.a, r.b);
            }
        }
    }
    let _ = writeln!(out, "{}", "=".repeat(w));
    out
}
