use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const GOOD_RUN: &str = "T,ENC,IMU,Lag,ENC_RAW\n\
0,0.0,0.0,5.0,406\n\
10,5.0,4.0,6.0,463\n\
20,10.0,9.0,5.0,520\n\
30,15.0,14.0,7.0,577\n\
40,20.0,19.0,5.0,634\n";

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("trackbench_cli").unwrap();
    cmd.env_remove("RUST_LOG").args(["--log-level", "warn"]);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["degrees", "--raw", "422", "--center", "422"], 0, "0.0000", "stdout")]
#[case(&["degrees", "--raw", "0", "--center", "4095"], 0, "0.0879", "stdout")]
#[case(&["degrees", "--raw", "406"], 0, "0.0000", "stdout")]
#[case(&["degrees"], 2, "required", "stderr")]
#[case(&["presets"], 0, "tare", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let assert = bin().args(args).assert().code(exit_code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn analyse_single_run_prints_every_metric() {
    let dir = tempdir().unwrap();
    let run = write(&dir, "bno085.csv", GOOD_RUN);

    bin()
        .arg("analyse")
        .arg(&run)
        .assert()
        .success()
        .stdout(predicate::str::contains("bno085"))
        .stdout(predicate::str::contains("mae_fast"))
        .stdout(predicate::str::contains("trail_pct"));
}

#[test]
fn analyse_two_runs_prints_side_by_side() {
    let dir = tempdir().unwrap();
    let a = write(&dir, "before.csv", GOOD_RUN);
    let b = write(&dir, "after.csv", GOOD_RUN);

    bin()
        .arg("analyse")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("before").and(predicate::str::contains("after")))
        .stdout(predicate::str::contains("Correlation & Tracking"));
}

#[test]
fn short_run_exits_with_insufficient_data() {
    let dir = tempdir().unwrap();
    let run = write(&dir, "short.csv", "T,ENC,IMU,Lag\n0,1.0,1.0,2.0\n");

    bin()
        .arg("analyse")
        .arg(&run)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("at least 2"));
}

#[test]
fn malformed_row_names_its_line() {
    let dir = tempdir().unwrap();
    let run = write(&dir, "bad.csv", "T,ENC,IMU,Lag\n0,1.0,1.0,2.0\n10,oops,1.0,2.0\n");

    bin()
        .arg("analyse")
        .arg(&run)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn missing_file_is_a_generic_failure() {
    bin()
        .args(["analyse", "/definitely/not/here.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not open"));
}

#[test]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = write(&dir, "cfg.toml", "[encoder]\naxis_center = 5000\n");

    bin()
        .arg("--config")
        .arg(&cfg)
        .arg("presets")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("axis_center"));
}

#[test]
fn config_sets_degrees_center() {
    let dir = tempdir().unwrap();
    let cfg = write(&dir, "cfg.toml", "[encoder]\naxis_center = 1000\n");

    bin()
        .arg("--config")
        .arg(&cfg)
        .args(["degrees", "--raw", "2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("90.0000"));
}

#[test]
fn stability_replay_reports_stable_time() {
    let dir = tempdir().unwrap();
    let levels = write(
        &dir,
        "levels.csv",
        "T,accel,gyro,mag\n0,1,1,1\n1000,2,2,2\n3000,1,2,2\n4000,2,3,2\n9000,2,2,2\n",
    );

    bin()
        .arg("stability")
        .arg("--levels")
        .arg(&levels)
        .assert()
        .success()
        .stdout(predicate::str::contains("converging -> unstable"))
        .stdout(predicate::str::contains("stable at 9000 ms"));
}

#[test]
fn stability_replay_that_never_settles_exits_5() {
    let dir = tempdir().unwrap();
    let levels = write(&dir, "levels.csv", "T,accel,gyro,mag\n0,3,3,0\n8000,3,3,1\n");

    bin()
        .arg("stability")
        .arg("--levels")
        .arg(&levels)
        .assert()
        .code(5)
        .stdout(predicate::str::contains("2 readings"))
        .stderr(predicate::str::contains("never became stable"));
}

#[test]
fn unknown_preset_lists_known_names() {
    let dir = tempdir().unwrap();
    let levels = write(&dir, "levels.csv", "T,mag\n0,3\n");

    bin()
        .arg("stability")
        .arg("--levels")
        .arg(&levels)
        .args(["--preset", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("assembly"));
}

#[test]
fn custom_preset_from_config_is_used() {
    let dir = tempdir().unwrap();
    let cfg = write(
        &dir,
        "cfg.toml",
        "[stability.quick]\nchannels = [\"gyro\"]\nthreshold = 1\nhold_ms = 100\n",
    );
    let levels = write(&dir, "levels.csv", "T,gyro\n0,1\n50,1\n100,1\n");

    bin()
        .arg("--config")
        .arg(&cfg)
        .arg("stability")
        .arg("--levels")
        .arg(&levels)
        .args(["--preset", "quick"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stable at 100 ms"));
}

#[test]
fn calibrate_tare_saves_a_record() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("cal.json");

    bin()
        .args(["calibrate", "--preset", "tare", "--ramp-ms", "10", "--save"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("calibration saved"));

    let record = fs::read_to_string(&out).unwrap();
    assert!(record.contains("\"preset\":\"tare\""), "{record}");
}

#[test]
fn calibrate_times_out_when_deadline_is_short() {
    let dir = tempdir().unwrap();
    let cfg = write(
        &dir,
        "cfg.toml",
        "[stability.slow]\nchannels = [\"mag\"]\nthreshold = 3\nhold_ms = 0\npoll_ms = 5\ndeadline_ms = 100\n",
    );
    let out = dir.path().join("cal.json");

    bin()
        .arg("--config")
        .arg(&cfg)
        .args(["calibrate", "--preset", "slow", "--ramp-ms", "60000", "--save"])
        .arg(&out)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("rotate on each axis"));
    assert!(!out.exists());
}
