//! Metrics engine: rate, latency, error, correlation, stratification, trailing.

use rstest::rstest;
use trackbench_core::metrics::{interval_velocities, pearson, stratified_mae, trail_percentage};
use trackbench_core::{
    AnalysisError, Dataset, METRIC_KEYS, MetricsCfg, Sample, compare, compute, compute_with,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Samples every `dt_ms` with the given reference, measured and latency series.
fn run(dt_ms: u64, refs: &[f64], meas: &[f64], lags: &[f64]) -> Dataset {
    let samples = refs
        .iter()
        .zip(meas)
        .zip(lags)
        .enumerate()
        .map(|(i, ((&r, &m), &l))| Sample::new(i as u64 * dt_ms, r, m, l))
        .collect();
    Dataset::new("run", samples).expect("valid dataset")
}

#[test]
fn rate_latency_and_error_statistics() {
    let ds = run(
        10,
        &[10.0, 20.0, 30.0, 40.0],
        &[9.0, 21.0, 27.0, 43.0],
        &[1.0, 2.0, 3.0, 4.0],
    );
    let r = compute(&ds).expect("report");

    assert_eq!(r.n_samples, 4);
    assert!(close(r.duration_s, 0.03));
    assert!(close(r.actual_hz, 100.0));
    assert!(close(r.dt_mean_ms, 10.0));
    assert!(close(r.dt_median_ms, 10.0));

    assert!(close(r.lag_mean, 2.5));
    assert!(close(r.lag_median, 2.5));
    assert!(close(r.lag_min, 1.0));
    assert!(close(r.lag_max, 4.0));
    assert!(close(r.lag_std, 1.25f64.sqrt()));

    // errors: 1, -1, 3, -3; the median picks the upper middle
    assert!(close(r.mae, 2.0));
    assert!(close(r.median_ae, 3.0));
    assert!(close(r.max_ae, 3.0));
    assert!(close(r.rms_error, 5.0f64.sqrt()));
    assert!(close(r.bias, 0.0));

    assert!(close(r.enc_range, 30.0));
    assert!(close(r.imu_range, 34.0));
}

#[test]
fn even_counts_use_upper_middle_except_latency() {
    // intervals 10, 10, 30, 30; abs errors 0.5, 1, 2, 4, 4
    let samples = vec![
        Sample::new(0, 10.0, 9.5, 1.0),
        Sample::new(10, 10.0, 9.0, 2.0),
        Sample::new(20, 10.0, 8.0, 3.0),
        Sample::new(50, 10.0, 6.0, 4.0),
        Sample::new(80, 10.0, 6.0, 100.0),
    ];
    let r = compute(&Dataset::new("five", samples.clone()).expect("valid")).expect("report");
    assert_eq!(r.dt_median_ms, 30.0);
    assert!(close(r.dt_mean_ms, 20.0));
    assert_eq!(r.lag_median, 3.0);
    assert_eq!(r.median_ae, 2.0);

    // intervals 10, 10, 30; lags 1..4; abs errors 0.5, 1, 2, 4
    let r = compute(&Dataset::new("four", samples[..4].to_vec()).expect("valid")).expect("report");
    assert_eq!(r.dt_median_ms, 10.0);
    assert_eq!(r.lag_median, 2.5);
    assert_eq!(r.median_ae, 2.0);
}

#[test]
fn bias_is_signed_reference_minus_measured() {
    let ds = run(10, &[0.0, 10.0, 20.0], &[-2.0, 8.0, 18.0], &[0.0; 3]);
    let r = compute(&ds).expect("report");
    assert!(close(r.bias, 2.0));
    assert!(close(r.mae, 2.0));
}

#[test]
fn repeated_computation_is_bit_identical() {
    let refs: Vec<f64> = (0..200).map(|i| (f64::from(i) * 0.13).sin() * 40.0).collect();
    let meas: Vec<f64> = refs.iter().map(|r| r * 0.97 + 0.3).collect();
    let lags: Vec<f64> = (0..200).map(|i| 5.0 + f64::from(i % 7)).collect();
    let ds = run(10, &refs, &meas, &lags);

    let a = compute(&ds).expect("report");
    let b = compute(&ds).expect("report");
    for ((ka, va), (kb, vb)) in a.entries().into_iter().zip(b.entries()) {
        assert_eq!(ka, kb);
        assert_eq!(va.to_bits(), vb.to_bits(), "metric {ka} drifted");
    }
}

#[test]
fn entries_follow_metric_keys() {
    let ds = run(10, &[0.0, 5.0], &[0.0, 4.0], &[1.0, 1.0]);
    let r = compute(&ds).expect("report");
    let keys: Vec<&str> = r.entries().iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, METRIC_KEYS);
    assert_eq!(r.get("n_samples"), Some(2.0));
    assert_eq!(r.get("no_such_metric"), None);
}

#[test]
fn identical_series_correlate_exactly() {
    let xs = [1.0, 3.5, -2.0, 8.25, 0.125, 7.0];
    assert_eq!(pearson(&xs, &xs), 1.0);
    let neg: Vec<f64> = xs.iter().map(|x| -x).collect();
    assert_eq!(pearson(&xs, &neg), -1.0);
}

#[rstest]
#[case(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0])]
#[case(&[1.0, 2.0, 3.0], &[0.1, 0.1, 0.1])]
#[case(&[], &[])]
fn constant_or_empty_series_correlate_zero(#[case] xs: &[f64], #[case] ys: &[f64]) {
    assert_eq!(pearson(xs, ys), 0.0);
}

#[test]
fn correlation_stays_in_bounds() {
    let xs: Vec<f64> = (0..500).map(|i| (f64::from(i) * 0.7).sin() * 1e6).collect();
    let ys: Vec<f64> = (0..500).map(|i| (f64::from(i) * 0.7).sin() * 1e6 + 1e-3).collect();
    let r = pearson(&xs, &ys);
    assert!((-1.0..=1.0).contains(&r), "got {r}");
}

#[rstest]
#[case(0)]
#[case(1)]
fn fewer_than_two_samples_is_insufficient(#[case] n: usize) {
    let samples = (0..n).map(|i| Sample::new(i as u64, 0.0, 0.0, 0.0)).collect();
    let ds = Dataset::new("short", samples).expect("valid dataset");
    let err = compute(&ds).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InsufficientData {
            label: "short".into(),
            samples: n
        }
    );
}

#[test]
fn dataset_rejects_time_going_backwards() {
    let err = Dataset::new(
        "bad",
        vec![Sample::new(10, 0.0, 0.0, 0.0), Sample::new(5, 0.0, 0.0, 0.0)],
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::NonMonotonicTime { index: 1, .. }));
}

#[test]
fn dataset_rejects_non_finite_values() {
    let err = Dataset::new("bad", vec![Sample::new(0, 0.0, f64::NAN, 0.0)]).unwrap_err();
    assert!(matches!(err, AnalysisError::NonFinite { index: 0, .. }));
}

#[test]
fn equal_timestamps_are_accepted_and_skipped_for_velocity() {
    let ds = Dataset::new(
        "dup",
        vec![
            Sample::new(0, 0.0, 0.0, 0.0),
            Sample::new(0, 1.0, 1.0, 0.0),
            Sample::new(10, 2.0, 2.0, 0.0),
        ],
    )
    .expect("non-decreasing is fine");
    let v = interval_velocities(ds.samples());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].0, 2);
    assert!(close(v[0].1, 100.0));
}

/// Reference increments at 10 ms spacing; fast intervals end at samples 7
/// and 1, slow ones at samples 2 and 4.
fn stratified_run() -> Dataset {
    let increments = [20.0, 0.1, 5.0, 0.2, 10.0, 3.0, 30.0, 4.0];
    let mut refs = vec![0.0];
    for inc in increments {
        refs.push(refs[refs.len() - 1] + inc);
    }
    let errors = [2.0, 0.0, 5.0, 2.0, 5.0, 2.0, 2.0, 0.0, 2.0];
    let meas: Vec<f64> = refs.iter().zip(errors).map(|(r, e)| r - e).collect();
    run(10, &refs, &meas, &[0.0; 9])
}

#[test]
fn fast_and_slow_quartiles_isolate_their_errors() {
    let ds = stratified_run();
    let (fast, slow) = stratified_mae(ds.samples(), 4);
    assert!(close(fast, 0.0), "fast {fast}");
    assert!(close(slow, 5.0), "slow {slow}");

    let r = compute(&ds).expect("report");
    assert!(close(r.mae_fast, 0.0));
    assert!(close(r.mae_slow, 5.0));
}

#[test]
fn too_few_intervals_leave_strata_at_zero() {
    let ds = run(10, &[0.0, 10.0, 30.0], &[5.0, 5.0, 5.0], &[0.0; 3]);
    assert_eq!(stratified_mae(ds.samples(), 4), (0.0, 0.0));
    let r = compute(&ds).expect("report");
    assert_eq!((r.mae_fast, r.mae_slow), (0.0, 0.0));
}

#[test]
fn strata_divisor_is_configurable() {
    let ds = stratified_run();
    let cfg = MetricsCfg {
        strata_divisor: 8,
        ..MetricsCfg::default()
    };
    let r = compute_with(&ds, &cfg).expect("report");
    // One interval per stratum: fastest ends at 7, slowest at 2.
    assert!(close(r.mae_fast, 0.0));
    assert!(close(r.mae_slow, 5.0));
}

#[rstest]
#[case::rising(5.0)]
#[case::falling(-5.0)]
fn one_sample_delay_trails_every_move(#[case] step: f64) {
    let refs: Vec<f64> = (0..20).map(|i| f64::from(i) * step).collect();
    let mut meas = vec![refs[0]];
    meas.extend_from_slice(&refs[..refs.len() - 1]);
    let ds = run(10, &refs, &meas, &[0.0; 20]);
    assert_eq!(trail_percentage(ds.samples(), 1.0), 100.0);
    assert_eq!(compute(&ds).expect("report").trail_pct, 100.0);
}

#[test]
fn measured_ahead_counts_as_leading() {
    let refs: Vec<f64> = (0..10).map(|i| f64::from(i) * 3.0).collect();
    let meas: Vec<f64> = refs.iter().map(|r| r + 3.0).collect();
    let ds = run(10, &refs, &meas, &[0.0; 10]);
    assert_eq!(trail_percentage(ds.samples(), 1.0), 0.0);
}

#[test]
fn near_stationary_motion_is_not_classified() {
    let refs = [0.0, 0.5, 1.0, 1.5, 2.0];
    let meas = [0.0, 0.0, 0.5, 1.0, 1.5];
    let ds = run(10, &refs, &meas, &[0.0; 5]);
    assert_eq!(trail_percentage(ds.samples(), 1.0), 0.0);
    // With a lower threshold the same lag is visible.
    assert_eq!(trail_percentage(ds.samples(), 0.25), 100.0);
}

#[test]
fn comparison_keeps_runs_independent() {
    let a = run(10, &[0.0, 10.0, 20.0], &[0.0, 9.0, 18.0], &[3.0; 3]);
    let b = Dataset::new(
        "b",
        vec![
            Sample::new(1000, 5.0, 5.0, 7.0),
            Sample::new(1020, 15.0, 15.0, 9.0),
        ],
    )
    .expect("valid dataset");
    let cmp = compare(&a, &b, &MetricsCfg::default()).expect("comparison");
    assert_eq!(cmp.a.report, compute(&a).expect("a"));
    assert_eq!(cmp.b.report, compute(&b).expect("b"));

    let n = cmp.row("n_samples").expect("row");
    assert_eq!((n.a, n.b), (3.0, 2.0));
    let lag = cmp.row("lag_mean").expect("row");
    assert!(close(lag.a, 3.0) && close(lag.b, 8.0));
    assert_eq!(cmp.rows().len(), METRIC_KEYS.len());
}

#[test]
fn comparison_fails_on_short_second_run() {
    let a = run(10, &[0.0, 10.0], &[0.0, 10.0], &[0.0; 2]);
    let b = Dataset::new("tiny", vec![Sample::new(0, 0.0, 0.0, 0.0)]).expect("valid");
    let err = compare(&a, &b, &MetricsCfg::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { ref label, samples: 1 } if label == "tiny"));
}
