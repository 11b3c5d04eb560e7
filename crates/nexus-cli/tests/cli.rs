//! CLI command integration tests.
//! Each test uses a temp directory via NEXUS_DATA_DIR for full isolation.

use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const DAY_MS: i64 = 86_400_000;

fn nexus_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("nexus").unwrap();
    cmd.env("NEXUS_DATA_DIR", data_dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Three records inside the last year, one far outside it.
fn write_corpus(dir: &TempDir) {
    let now = now_ms();
    let records = json!([
        {
            "id": "00000000-0000-4000-8000-000000000001",
            "author": "mira",
            "createdAt": now - 2 * DAY_MS,
            "summary": "Lucid dream about flying over the harbor",
            "tags": ["dream", "positive", "city:hamburg"],
            "intensity": 7,
            "likes": 4,
            "corroborations": 1
        },
        {
            "id": "00000000-0000-4000-8000-000000000002",
            "author": "jonas",
            "createdAt": now - 20 * DAY_MS,
            "summary": "Recurring dream of a locked door",
            "tags": ["dream", "negative"],
            "intensity": 3,
            "likes": 9,
            "corroborations": 0
        },
        {
            "id": "00000000-0000-4000-8000-000000000003",
            "author": "mira",
            "createdAt": now - 40 * DAY_MS,
            "summary": "Strange lights above the forest",
            "tags": ["sighting", "mixed"],
            "intensity": 9,
            "likes": 1,
            "corroborations": 5
        },
        {
            "id": "00000000-0000-4000-8000-000000000004",
            "author": "old",
            "createdAt": now - 800 * DAY_MS,
            "summary": "An ancient dream",
            "tags": ["dream"],
            "intensity": 5
        }
    ]);
    std::fs::write(
        dir.path().join("corpus.json"),
        serde_json::to_string_pretty(&records).unwrap(),
    )
    .unwrap();
}

fn created_id(stdout: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    stdout
        .split_whitespace()
        .nth(2)
        .expect("id in create output")
        .to_string()
}

#[test]
fn agent_lifecycle() {
    let dir = TempDir::new().unwrap();

    let output = nexus_cmd(&dir)
        .args(["agent", "create", "Dream watch", "--query", "dream"])
        .args(["--filter", "mood:positive", "--schedule", "weekly"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = created_id(&output.stdout);

    nexus_cmd(&dir)
        .args(["agent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dream watch"))
        .stdout(predicate::str::contains("weekly"))
        .stdout(predicate::str::contains("idle"));

    nexus_cmd(&dir)
        .args(["agent", "toggle", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("now inactive"));

    nexus_cmd(&dir)
        .args(["agent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inactive"));

    nexus_cmd(&dir)
        .args(["agent", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted agent"));

    nexus_cmd(&dir)
        .args(["agent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no agents)"));
}

#[test]
fn agent_create_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["agent", "create", "   ", "--query", "dream"])
        .assert()
        .failure();

    nexus_cmd(&dir)
        .args(["agent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no agents)"));
}

#[test]
fn agent_toggle_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["agent", "toggle", "00000000-0000-4000-8000-0000000000ff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no agent with id"));
}

#[test]
fn agent_run_reports_new_results_once() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);

    let output = nexus_cmd(&dir)
        .args(["agent", "create", "Dreams", "--query", "dream"])
        .output()
        .unwrap();
    let id = created_id(&output.stdout);

    nexus_cmd(&dir)
        .args(["agent", "run", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 new result(s)"));

    nexus_cmd(&dir)
        .args(["agent", "run", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("no new results"));

    nexus_cmd(&dir)
        .args(["notifications"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 new result(s)"));
}

#[test]
fn search_filters_and_sorts() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);

    let output = nexus_cmd(&dir)
        .args(["search", "dream", "--sort", "popularitaet"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let door = stdout.find("locked door").expect("door result");
    let harbor = stdout.find("harbor").expect("harbor result");
    assert!(door < harbor, "more likes first:\n{stdout}");
    assert!(!stdout.contains("ancient"), "outside the last year");
    assert!(stdout.contains("2 of 2 results"));

    nexus_cmd(&dir)
        .args(["search", "dream", "--mood", "positive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harbor"))
        .stdout(predicate::str::contains("locked door").not());

    nexus_cmd(&dir)
        .args(["search", "--verified", "--intensity", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Strange lights"))
        .stdout(predicate::str::contains("1 of 1 results"));

    nexus_cmd(&dir)
        .args(["search", "city:hamburg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harbor"));
}

#[test]
fn search_json_output() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);

    let output = nexus_cmd(&dir)
        .args(["search", "author:mira", "--sort", "datum", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0]["createdAt"].as_i64() > items[1]["createdAt"].as_i64());
}

#[test]
fn search_without_corpus_fails() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["search", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("query execution failed"));
}

#[test]
fn saved_search_roundtrip() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);

    let output = nexus_cmd(&dir)
        .args(["saved", "save", "Good dreams", "dream", "--mood", "positive"])
        .output()
        .unwrap();
    assert!(output.status.success());

    nexus_cmd(&dir)
        .args(["saved", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Good dreams"))
        .stdout(predicate::str::contains("mood:positive"));

    nexus_cmd(&dir)
        .args(["saved", "apply", "Good dreams"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harbor"))
        .stdout(predicate::str::contains("locked door").not());

    let id = created_id(&output.stdout);
    nexus_cmd(&dir)
        .args(["saved", "delete", &id])
        .assert()
        .success();
    nexus_cmd(&dir)
        .args(["saved", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no saved searches)"));
}

#[test]
fn saved_save_requires_tokens() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["saved", "save", "Nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to save"));
}

#[test]
fn react_toggles_and_persists() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    let id = "00000000-0000-4000-8000-000000000001";

    nexus_cmd(&dir)
        .args(["react", id, "like"])
        .assert()
        .success()
        .stdout(predicate::str::contains("likes=5"))
        .stdout(predicate::str::contains("liked=true"));

    nexus_cmd(&dir)
        .args(["react", id, "like"])
        .assert()
        .success()
        .stdout(predicate::str::contains("likes=4"))
        .stdout(predicate::str::contains("liked=false"));

    nexus_cmd(&dir)
        .args(["react", id, "corroborate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("corr=2"));

    let raw = std::fs::read_to_string(dir.path().join("corpus.json")).unwrap();
    assert!(raw.contains("\"corroborations\": 2"));
}

#[test]
fn render_writes_svg_for_every_mode() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);

    for mode in ["pins", "heatmap", "radar", "graph"] {
        let out = dir.path().join(format!("{mode}.svg"));
        nexus_cmd(&dir)
            .args(["render", "--mode", mode, "--width", "320", "--height", "200"])
            .arg("--out")
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("rendered 3 result(s)"));
        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.starts_with("<svg"), "{mode}: {svg}");
        assert!(svg.contains("width=\"320\""));
    }
}

#[test]
fn render_radar_runs_frames() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    let out = dir.path().join("radar.svg");

    nexus_cmd(&dir)
        .args(["--verbose", "render", "--mode", "radar", "--frames", "3"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("animation finished"));
    assert!(out.exists());
}

#[test]
fn timeline_drag_clamps_to_min_gap() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["timeline", "--start-pos", "20", "--end-pos", "50"])
        .args(["--drag", "start", "--from", "20", "--to", "90"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start=45.00 end=50.00"));
}

#[test]
fn timeline_range_drag_keeps_width() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["timeline", "--start-pos", "20", "--end-pos", "50"])
        .args(["--drag", "range", "--from", "30", "--to", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start=70.00 end=100.00"));
}

#[test]
fn timeline_preset_and_pixels() {
    let dir = TempDir::new().unwrap();
    nexus_cmd(&dir)
        .args(["timeline", "--preset", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start=0.00 end=100.00"));

    nexus_cmd(&dir)
        .args(["timeline", "--start-pos", "0", "--end-pos", "50"])
        .args(["--drag", "end", "--from", "100", "--to", "300"])
        .args(["--track-width", "400"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start=0.00 end=100.00"));
}

#[test]
fn daemon_runs_bounded_ticks() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);

    nexus_cmd(&dir)
        .args(["agent", "create", "Dreams", "--query", "dream", "--schedule", "hourly"])
        .assert()
        .success();

    // A fresh agent is not due until one interval after creation.
    nexus_cmd(&dir)
        .args(["daemon", "--tick-secs", "1", "--max-ticks", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ticks=1 dispatched=0"));

    assert!(!dir.path().join("nexus-daemon.pid").exists());
}

#[test]
fn config_file_sets_default_sort() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    std::fs::write(dir.path().join("nexus.toml"), "default_sort = \"datum\"\n").unwrap();

    nexus_cmd(&dir)
        .args(["search", "dream"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sorted by datum"));

    std::fs::write(dir.path().join("nexus.toml"), "tick_interval_secs = 0\n").unwrap();
    nexus_cmd(&dir)
        .args(["agent", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
