//! Tracking-quality metrics for one encoder-vs-IMU run.
//!
//! The encoder is ground truth. Every metric is a pure function of the
//! dataset: no clocks, no randomness, no state between calls.
//!
//! Angle errors are taken on the raw `reference - measured` difference without
//! wrap folding. Runs are expected to stay within a non-wrapping window, and a
//! constant calibration offset should show up in the numbers rather than be
//! folded away.

use crate::config::MetricsCfg;
use crate::dataset::{Dataset, Sample};
use crate::error::AnalysisError;
use crate::util::{MILLIS_PER_SEC, mean, median, min_max, population_std, upper_median};

/// Every metric derived from one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    // Sample rate
    pub n_samples: usize,
    pub duration_s: f64,
    pub actual_hz: f64,
    pub dt_mean_ms: f64,
    /// Upper-middle interval; always one of the observed intervals.
    pub dt_median_ms: f64,
    // Latency (ms)
    pub lag_mean: f64,
    /// Averages the two middle values for even counts.
    pub lag_median: f64,
    pub lag_min: f64,
    pub lag_max: f64,
    pub lag_std: f64,
    // Angle error (deg)
    pub mae: f64,
    /// Upper-middle absolute error.
    pub median_ae: f64,
    pub max_ae: f64,
    pub rms_error: f64,
    /// Mean of `reference - measured`; positive when the IMU reads low.
    pub bias: f64,
    /// Pearson r between the two angle series; 0.0 when either is constant.
    pub correlation: f64,
    /// MAE over samples ending the fastest velocity stratum.
    pub mae_fast: f64,
    /// MAE over samples ending the slowest velocity stratum.
    pub mae_slow: f64,
    /// Share of moving intervals where the IMU sits behind the motion, percent.
    pub trail_pct: f64,
    pub enc_range: f64,
    pub imu_range: f64,
}

/// Stable metric keys, in report order.
pub const METRIC_KEYS: [&str; 21] = [
    "n_samples",
    "duration_s",
    "actual_hz",
    "dt_mean_ms",
    "dt_median_ms",
    "lag_mean",
    "lag_median",
    "lag_min",
    "lag_max",
    "lag_std",
    "mae",
    "median_ae",
    "max_ae",
    "rms_error",
    "bias",
    "correlation",
    "mae_fast",
    "mae_slow",
    "trail_pct",
    "enc_range",
    "imu_range",
];

impl MetricsReport {
    /// Flat `(key, value)` listing in `METRIC_KEYS` order.
    pub fn entries(&self) -> [(&'static str, f64); 21] {
        let values = [
            self.n_samples as f64,
            self.duration_s,
            self.actual_hz,
            self.dt_mean_ms,
            self.dt_median_ms,
            self.lag_mean,
            self.lag_median,
            self.lag_min,
            self.lag_max,
            self.lag_std,
            self.mae,
            self.median_ae,
            self.max_ae,
            self.rms_error,
            self.bias,
            self.correlation,
            self.mae_fast,
            self.mae_slow,
            self.trail_pct,
            self.enc_range,
            self.imu_range,
        ];
        std::array::from_fn(|i| (METRIC_KEYS[i], values[i]))
    }

    /// Look a metric up by key.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

/// Compute all metrics with default settings.
pub fn compute(dataset: &Dataset) -> Result<MetricsReport, AnalysisError> {
    compute_with(dataset, &MetricsCfg::default())
}

pub fn compute_with(dataset: &Dataset, cfg: &MetricsCfg) -> Result<MetricsReport, AnalysisError> {
    let s = dataset.samples();
    let n = s.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            label: dataset.label().to_string(),
            samples: n,
        });
    }
    let nf = n as f64;

    // --- Sample rate ---
    let span_ms = s[n - 1].time_ms.saturating_sub(s[0].time_ms);
    let duration_s = span_ms as f64 / MILLIS_PER_SEC;
    let actual_hz = if duration_s > 0.0 {
        (n - 1) as f64 / duration_s
    } else {
        0.0
    };
    let dts: Vec<f64> = s
        .windows(2)
        .map(|w| w[1].time_ms.saturating_sub(w[0].time_ms) as f64)
        .collect();

    // --- Latency ---
    let lags: Vec<f64> = s.iter().map(|x| x.latency_ms).collect();
    let lag_mean = mean(&lags);
    let (lag_min, lag_max) = min_max(&lags);

    // --- Angle error ---
    let errors: Vec<f64> = s.iter().map(Sample::error_deg).collect();
    let abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
    let rms_error = (abs_errors.iter().map(|e| e * e).sum::<f64>() / nf).sqrt();

    // --- Shape ---
    let refs: Vec<f64> = s.iter().map(|x| x.reference_deg).collect();
    let meas: Vec<f64> = s.iter().map(|x| x.measured_deg).collect();
    let (ref_lo, ref_hi) = min_max(&refs);
    let (meas_lo, meas_hi) = min_max(&meas);
    let (mae_fast, mae_slow) = stratified_mae(s, cfg.strata_divisor);

    let report = MetricsReport {
        n_samples: n,
        duration_s,
        actual_hz,
        dt_mean_ms: mean(&dts),
        dt_median_ms: upper_median(&dts),
        lag_mean,
        lag_median: median(&lags),
        lag_min,
        lag_max,
        lag_std: population_std(&lags, lag_mean),
        mae: mean(&abs_errors),
        median_ae: upper_median(&abs_errors),
        max_ae: min_max(&abs_errors).1,
        rms_error,
        bias: mean(&errors),
        correlation: pearson(&refs, &meas),
        mae_fast,
        mae_slow,
        trail_pct: trail_percentage(s, cfg.moving_threshold_deg),
        enc_range: ref_hi - ref_lo,
        imu_range: meas_hi - meas_lo,
    };
    tracing::debug!(
        label = dataset.label(),
        n_samples = n,
        mae = report.mae,
        bias = report.bias,
        "metrics computed"
    );
    Ok(report)
}

/// Pearson product-moment correlation using population moments.
///
/// Returns 0.0 if either series is constant. Identical series give exactly 1.0.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    // Exact-constant check; the mean of a constant series is not always exact.
    let (x_lo, x_hi) = min_max(xs);
    let (y_lo, y_hi) = min_max(ys);
    if x_lo == x_hi || y_lo == y_hi {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let (mut sxy, mut sxx, mut syy) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if !(sxx > 0.0 && syy > 0.0) {
        return 0.0;
    }
    // sqrt(v * v) == v in IEEE arithmetic, so identical series hit 1.0 exactly.
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Per-interval reference speed in deg/s, keyed by the index of the sample
/// that ends the interval. Zero-length intervals are skipped.
pub fn interval_velocities(samples: &[Sample]) -> Vec<(usize, f64)> {
    samples
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| {
            let dt_ms = w[1].time_ms.saturating_sub(w[0].time_ms);
            if dt_ms == 0 {
                return None;
            }
            let dt_s = dt_ms as f64 / MILLIS_PER_SEC;
            Some((i + 1, (w[1].reference_deg - w[0].reference_deg).abs() / dt_s))
        })
        .collect()
}

/// `(mae_fast, mae_slow)` over the top and bottom velocity strata.
///
/// Each stratum holds `intervals / divisor` intervals; both are 0.0 when that
/// rounds down to zero.
pub fn stratified_mae(samples: &[Sample], divisor: usize) -> (f64, f64) {
    let mut v = interval_velocities(samples);
    // Stable sort keeps equal speeds in time order.
    v.sort_by(|a, b| a.1.total_cmp(&b.1));
    let k = v.len() / divisor.max(1);
    if k == 0 {
        return (0.0, 0.0);
    }
    let mae_of = |part: &[(usize, f64)]| {
        part.iter()
            .map(|&(i, _)| samples[i].error_deg().abs())
            .sum::<f64>()
            / part.len() as f64
    };
    (mae_of(&v[v.len() - k..]), mae_of(&v[..k]))
}

/// Percentage of moving intervals in which the IMU trails the encoder.
///
/// An interval is moving when the reference changed by more than
/// `moving_threshold_deg`. It trails when the motion and `reference - measured`
/// share a sign; anything else, including a zero offset, counts as leading.
pub fn trail_percentage(samples: &[Sample], moving_threshold_deg: f64) -> f64 {
    let mut trailing = 0usize;
    let mut leading = 0usize;
    for w in samples.windows(2) {
        let motion = w[1].reference_deg - w[0].reference_deg;
        if motion.abs() <= moving_threshold_deg {
            continue;
        }
        if motion * w[1].error_deg() > 0.0 {
            trailing += 1;
        } else {
            leading += 1;
        }
    }
    let classified = trailing + leading;
    if classified == 0 {
        0.0
    } else {
        trailing as f64 / classified as f64 * 100.0
    }
}
