//! Concurrency tests for progtrack.
//!
//! Reports only take shared locks on the exports, so several readers can
//! run against the same rows directory at once.

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use std::thread;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("progtrack"))
}

fn setup_test_dir() -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    fs::write(
        dir.join("program.json"),
        r#"{ "weeks": [ { "week": 1, "days": [
            { "day": 1, "blocks": [ { "blockName": "STRENGTH", "exercises": [ { "name": "Squat" } ] } ] },
            { "day": 2, "blocks": [ { "blockName": "STRENGTH", "exercises": [ { "name": "Bench" } ] } ] }
        ] } ] }"#,
    )
    .unwrap();
    fs::write(dir.join("config.toml"), "").unwrap();

    let rows = dir.join("rows");
    fs::create_dir_all(&rows).unwrap();
    fs::write(
        rows.join("exercise_logs.jsonl"),
        r#"{"program_id":5,"week":1,"day":1,"block":"STRENGTH","exercise_name":"Squat","set_number":1}"#,
    )
    .unwrap();

    temp_dir
}

fn report_json(dir: PathBuf) -> Vec<u8> {
    cli()
        .arg("report")
        .arg("--json")
        .arg("--program")
        .arg(dir.join("program.json"))
        .arg("--program-id")
        .arg("5")
        .arg("--rows")
        .arg(dir.join("rows"))
        .arg("--config")
        .arg(dir.join("config.toml"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone()
}

#[test]
fn test_concurrent_readers_agree() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dir = dir.clone();
            thread::spawn(move || report_json(dir))
        })
        .collect();

    let outputs: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Reader thread panicked"))
        .collect();

    for output in &outputs[1..] {
        assert_eq!(output, &outputs[0]);
    }

    let summary: serde_json::Value = serde_json::from_slice(&outputs[0]).unwrap();
    assert_eq!(summary["totalTasksCompleted"], 1);
    assert_eq!(summary["currentDay"], 2);
}
