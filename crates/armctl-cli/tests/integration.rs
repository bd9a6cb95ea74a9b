#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn armctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("armctl").unwrap();
    cmd.current_dir(dir.path())
        .env("ARMCTL_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    armctl(dir).arg("init").assert().success();
}

fn write_instructions(dir: &TempDir, json: &str) {
    std::fs::write(dir.path().join("armInstructions.json"), json).unwrap();
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

const WAVE: &str = r#"{
  "instructions": [
    { "name": "wave", "configuration": { "S3": 0 }, "seconds": 1 }
  ]
}"#;

// ---------------------------------------------------------------------------
// armctl init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config_and_sample() {
    let dir = TempDir::new().unwrap();
    armctl(&dir).arg("init").assert().success();

    assert!(dir.path().join("arm.yaml").exists());
    assert!(dir.path().join("armInstructions.json").exists());
    let yaml = std::fs::read_to_string(dir.path().join("arm.yaml")).unwrap();
    assert!(yaml.contains("settle_seconds"));
    assert!(yaml.contains("S5"));
}

#[test]
fn init_keeps_existing_files() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, WAVE);
    armctl(&dir)
        .args(["init", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"instructions_written\": false"));
    let content = std::fs::read_to_string(dir.path().join("armInstructions.json")).unwrap();
    assert_eq!(content, WAVE);
}

// ---------------------------------------------------------------------------
// armctl run
// ---------------------------------------------------------------------------

#[test]
fn run_sample_sequence_completes() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let report = stdout_json(armctl(&dir).args(["run", "--settle", "0", "--json"]));
    assert_eq!(report["outcome"], "completed");
    assert_eq!(report["instructions_total"], 6);
    assert_eq!(report["instructions_executed"], 6);
    // gripper released at the end: actual 0 is input 80
    assert_eq!(report["final_angles"]["S5"], 80.0);
}

#[test]
fn run_wave_lands_wrist_on_sixty() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, WAVE);

    let report = stdout_json(armctl(&dir).args(["--json", "run", "--settle", "0"]));
    assert_eq!(report["final_angles"]["S3"], 60.0);
    assert_eq!(report["commands_issued"], 1);
    // untouched joints stay at their home angle
    assert_eq!(report["final_angles"]["S1"], 90.0);
}

#[test]
fn run_human_output_lists_joints() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, WAVE);

    armctl(&dir)
        .args(["run", "--settle", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed 1 instructions"))
        .stdout(predicate::str::contains("wrist"));
}

#[test]
fn run_with_interpolation_still_lands_on_target() {
    let dir = TempDir::new().unwrap();
    write_instructions(
        &dir,
        r#"{"instructions":[{"name":"grab","configuration":{"S5":180},"seconds":0.02}]}"#,
    );

    let report = stdout_json(armctl(&dir).args([
        "run",
        "--settle",
        "0",
        "--divisions",
        "4",
        "--json",
    ]));
    assert_eq!(report["commands_issued"], 4);
    assert_eq!(report["final_angles"]["S5"], 150.0);
}

#[test]
fn run_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other.json");
    std::fs::write(&path, WAVE).unwrap();

    armctl(&dir)
        .args(["run", "--settle", "0", "--file"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn run_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    armctl(&dir)
        .args(["run", "--settle", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read instruction file"));
}

#[test]
fn run_malformed_file_fails_before_motion() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, r#"{"instructions": [ { "name": "wave", "#);

    armctl(&dir)
        .args(["run", "--settle", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed instruction data"))
        .stdout(predicate::str::contains("Completed").not());
}

#[test]
fn run_unknown_joint_fails() {
    let dir = TempDir::new().unwrap();
    write_instructions(
        &dir,
        r#"{"instructions":[{"name":"x","configuration":{"S4":10},"seconds":1}]}"#,
    );

    armctl(&dir)
        .args(["run", "--settle", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("S4"));
}

#[test]
fn run_out_of_range_names_instruction_and_joint() {
    let dir = TempDir::new().unwrap();
    write_instructions(
        &dir,
        r#"{"instructions":[
            {"name":"ok","configuration":{"S3":0},"seconds":0},
            {"name":"overreach","configuration":{"S3":200},"seconds":0}
        ]}"#,
    );

    armctl(&dir)
        .args(["run", "--settle", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("overreach"))
        .stderr(predicate::str::contains("joint S3"));
}

#[test]
fn run_rejects_zero_divisions() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, WAVE);

    armctl(&dir)
        .args(["run", "--divisions", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("divisions"));
}

#[test]
fn run_rejects_unbounded_settle_before_motion() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, WAVE);

    armctl(&dir)
        .args(["run", "--settle", "1e19"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("settle_seconds"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn run_rejects_oversized_instruction_duration() {
    let dir = TempDir::new().unwrap();
    write_instructions(
        &dir,
        r#"{"instructions":[{"name":"forever","configuration":{"S3":0},"seconds":1e300}]}"#,
    );

    armctl(&dir)
        .args(["run", "--settle", "0", "--divisions", "2"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("forever"));
}

// ---------------------------------------------------------------------------
// armctl plan / convert / calibration
// ---------------------------------------------------------------------------

#[test]
fn plan_shows_native_targets() {
    let dir = TempDir::new().unwrap();
    write_instructions(&dir, WAVE);

    let rows = stdout_json(armctl(&dir).args(["plan", "--json"]));
    assert_eq!(rows[0]["instruction"], "wave");
    assert_eq!(rows[0]["joint"], "S3");
    assert_eq!(rows[0]["input"], 60.0);
    assert_eq!(rows[0]["in_range"], true);
}

#[test]
fn plan_flags_out_of_range_targets() {
    let dir = TempDir::new().unwrap();
    write_instructions(
        &dir,
        r#"{"instructions":[{"name":"overreach","configuration":{"S3":200},"seconds":0}]}"#,
    );

    armctl(&dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("OUT OF RANGE"));
}

#[test]
fn convert_forward_and_inverse() {
    let dir = TempDir::new().unwrap();

    armctl(&dir)
        .args(["convert", "S3", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("input 60"));

    let v = stdout_json(armctl(&dir).args(["--json", "convert", "s0", "-70"]));
    assert_eq!(v["input"], 0.0);

    let v = stdout_json(armctl(&dir).args(["--json", "convert", "S5", "150", "--inverse"]));
    assert_eq!(v["actual"], 180.0);
}

#[test]
fn convert_rejects_unknown_joint() {
    let dir = TempDir::new().unwrap();
    armctl(&dir)
        .args(["convert", "S9", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("S9"));
}

#[test]
fn calibration_lists_every_joint() {
    let dir = TempDir::new().unwrap();
    let rows = stdout_json(armctl(&dir).args(["calibration", "--json"]));
    let joints: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["joint"].as_str().unwrap())
        .collect();
    assert_eq!(joints, ["S0", "S1", "S2", "S3", "S5"]);
}

// ---------------------------------------------------------------------------
// armctl config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_default_is_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    armctl(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_shared_channel() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("arm.yaml"),
        "joints:\n  S0:\n    channel: 2\n    calibration: [{input: 90, actual: 0}, {input: 0, actual: -70}]\n  S2:\n    channel: 2\n    calibration: [{input: 90, actual: -100}, {input: 180, actual: -40}]\n",
    )
    .unwrap();

    armctl(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("share channel 2"));

    write_instructions(&dir, WAVE);
    armctl(&dir)
        .args(["run", "--settle", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn config_show_fills_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("arm.yaml"), "timing:\n  divisions: 3\n").unwrap();
    let v = stdout_json(armctl(&dir).args(["config", "show", "--json"]));
    assert_eq!(v["timing"]["divisions"], 3);
    assert_eq!(v["timing"]["settle_seconds"], 2.0);
    assert_eq!(v["board"]["channels"], 16);
}
