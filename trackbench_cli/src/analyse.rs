//! `analyse` and `degrees` commands.

use std::path::Path;

use eyre::WrapErr;
use serde_json::{Map, Value, json};
use trackbench_config::Config;
use trackbench_core::{
    AxisFrame, Comparison, Dataset, LabelledReport, MetricsCfg, MetricsReport, dataset_from_rows,
    render_comparison, render_single,
};

/// Dataset label: the file stem, falling back to the full path.
fn label_for(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

fn load_dataset(path: &Path) -> eyre::Result<Dataset> {
    let rows = trackbench_config::load_samples_csv(path)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded sample log");
    let ds = dataset_from_rows(label_for(path), &rows)
        .wrap_err_with(|| format!("validate {}", path.display()))?;
    Ok(ds)
}

fn metric_value(report: &MetricsReport, key: &str, value: f64) -> Value {
    if key == "n_samples" {
        json!(report.n_samples)
    } else {
        json!(value)
    }
}

fn report_json(r: &LabelledReport) -> Value {
    let metrics: Map<String, Value> = r
        .report
        .entries()
        .into_iter()
        .map(|(k, v)| (k.to_string(), metric_value(&r.report, k, v)))
        .collect();
    json!({ "label": r.label, "metrics": metrics })
}

fn comparison_json(cmp: &Comparison) -> Value {
    let metrics: Map<String, Value> = cmp
        .rows()
        .into_iter()
        .map(|row| {
            (
                row.key.to_string(),
                json!({
                    cmp.a.label.as_str(): metric_value(&cmp.a.report, row.key, row.a),
                    cmp.b.label.as_str(): metric_value(&cmp.b.report, row.key, row.b),
                }),
            )
        })
        .collect();
    json!({ "labels": [cmp.a.label, cmp.b.label], "metrics": metrics })
}

pub fn run_analyse(
    cfg: &Config,
    file: &Path,
    other: Option<&Path>,
    json: bool,
) -> eyre::Result<()> {
    let metrics_cfg = MetricsCfg::from(&cfg.analysis);
    let a = load_dataset(file)?;

    match other {
        None => {
            let report = trackbench_core::analyse(&a, &metrics_cfg)?;
            if json {
                println!("{}", report_json(&report));
            } else {
                print!("{}", render_single(&report.label, &report.report));
            }
        }
        Some(path) => {
            let b = load_dataset(path)?;
            let mut cmp = trackbench_core::compare(&a, &b, &metrics_cfg)?;
            if cmp.a.label == cmp.b.label {
                cmp.b.label = format!("{} (2)", cmp.b.label);
            }
            if json {
                println!("{}", comparison_json(&cmp));
            } else {
                print!("{}", render_comparison(&cmp));
            }
        }
    }
    Ok(())
}

pub fn run_degrees(cfg: &Config, raw: i32, center: Option<i32>, json: bool) -> eyre::Result<()> {
    let frame = center.map_or_else(|| AxisFrame::from(&cfg.encoder), AxisFrame::new);
    let deg = frame.to_degrees(raw);
    if json {
        println!(
            "{}",
            json!({ "raw": raw, "center": frame.axis_center, "degrees": deg })
        );
    } else {
        println!("{deg:.4}");
    }
    Ok(())
}
