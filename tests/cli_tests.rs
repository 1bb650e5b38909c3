//! Command-line tests for the clipbatch binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Binary running inside `dir`, isolated from any clipbatch.toml or env overrides
fn clipbatch(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clipbatch").unwrap();
    cmd.current_dir(dir)
        .env_remove("CLIPBATCH_CONFIG")
        .env_remove("CLIPBATCH_LOG_LEVEL")
        .env_remove("CLIPBATCH_PARALLEL_JOBS")
        .env_remove("CLIPBATCH_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    clipbatch(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("separate"))
        .stdout(predicate::str::contains("gif"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_dry_run_prints_split_payload() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.mp4");
    touch(dir.path(), "b.mp4");

    clipbatch(dir.path())
        .args(["--dry-run", "split", "a.mp4", "b.mp4", "--duration", "1:00", "--fps-for", "b.mp4=24"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""split_method": "duration""#))
        .stdout(predicate::str::contains(r#""split_value": 60.0"#))
        .stdout(predicate::str::contains(r#""fps_mode": "per_file""#))
        .stdout(predicate::str::contains(r#""b.mp4": 24.0"#));
}

#[test]
fn test_dry_run_expands_directories() {
    let dir = TempDir::new().unwrap();
    let footage = dir.path().join("footage");
    fs::create_dir_all(footage.join("day2")).unwrap();
    touch(&footage, "one.mov");
    touch(&footage.join("day2"), "two.mkv");
    touch(&footage, "readme.txt");

    clipbatch(dir.path())
        .args(["--dry-run", "separate", "footage", "--sample-rate", "44100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("one.mov"))
        .stdout(predicate::str::contains("two.mkv"))
        .stdout(predicate::str::contains("readme.txt").not())
        .stdout(predicate::str::contains(r#""sample_rate": 44100"#));
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.mp4");
    fs::write(
        dir.path().join("clipbatch.toml"),
        "[defaults]\nsample_rate = 22050\nparallel_jobs = 3\n",
    )
    .unwrap();

    clipbatch(dir.path())
        .args(["--dry-run", "separate", "a.mp4"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""sample_rate": 22050"#))
        .stdout(predicate::str::contains(r#""parallel_jobs": 3"#));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    clipbatch(dir.path())
        .args(["--dry-run", "split", "nope.mp4", "--segments", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input does not exist"));
}

#[test]
fn test_no_worker_configured() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.mp4");
    clipbatch(dir.path())
        .args(["split", "a.mp4", "--segments", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No worker configured"));
}

#[cfg(unix)]
#[test]
fn test_runs_worker_and_reports_summary() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.mp4");
    fs::write(
        dir.path().join("worker.sh"),
        r#"cat > /dev/null
echo '{"event":"file_start","file":"a.mp4"}'
echo '{"event":"file_complete","file":"a.mp4","success":true,"output_dir":"out/a"}'
echo '{"event":"complete","total_files":1,"successful":1,"failed":0}'
"#,
    )
    .unwrap();

    clipbatch(dir.path())
        .args(["--worker", "sh", "--worker-arg", "worker.sh", "split", "a.mp4", "--duration", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded / 0 failed"));
}

#[cfg(unix)]
#[test]
fn test_failing_worker_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.mp4");
    fs::write(
        dir.path().join("worker.sh"),
        r#"cat > /dev/null
echo '{"event":"complete","total_files":1,"successful":1,"failed":0}'
exit 2
"#,
    )
    .unwrap();

    clipbatch(dir.path())
        .args(["--json", "--worker", "sh", "--worker-arg", "worker.sh", "split", "a.mp4", "--segments", "2"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""event":"summary""#));
}
