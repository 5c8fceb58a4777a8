use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn setup_store(root: &Path) -> PathBuf {
    let primary = root.join("data.json");
    std::fs::write(&primary, r#"{"categories":"[]","notes":"[]"}"#)
        .expect("primary should be writable");
    let config = root.join("notekeep.toml");
    std::fs::write(
        &config,
        format!("data_path = {:?}\n", primary.to_str().expect("utf8 path")),
    )
    .expect("config should be writable");
    config
}

fn run_notekeep(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_notekeep"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("notekeep command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout should be JSON ({err}):\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn note_lifecycle_dispatches_through_the_binary() {
    let root = unique_workspace("notekeep-cli-dispatch");
    let config = setup_store(&root);

    let added = run_notekeep(&config, &["add", "hello & goodbye", "--title", "first"]);
    assert_success(&added);
    let report = parse_json(&added);
    assert_eq!(report["category"]["name"], "INBOX");
    assert_eq!(report["category"]["note_count"], 1);
    assert_eq!(report["note"]["content"], "hello &amp; goodbye");

    let added = run_notekeep(
        &config,
        &["add", "work item", "--title", "second", "--category", "Work"],
    );
    assert_success(&added);

    let listed = run_notekeep(&config, &["notes", "--category", "work"]);
    assert_success(&listed);
    let report = parse_json(&listed);
    assert_eq!(report["count"], 1);
    assert_eq!(report["notes"][0]["title"], "second");

    let missing = run_notekeep(&config, &["notes", "--category", "ghost"]);
    assert_success(&missing);
    let report = parse_json(&missing);
    assert_eq!(report["count"], 0);
    assert_eq!(report["message"], "category 'ghost' not found");

    let fetched = run_notekeep(&config, &["get", "Work", "second"]);
    assert_success(&fetched);
    let report = parse_json(&fetched);
    assert_eq!(report["note"]["content"], "work item");

    let empty = run_notekeep(&config, &["add", "   "]);
    assert_failure(&empty);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn cleanup_demands_confirmation_and_snapshots_before_deleting() {
    let root = unique_workspace("notekeep-cli-cleanup");
    let config = setup_store(&root);

    for title in ["a", "b"] {
        let added = run_notekeep(
            &config,
            &["add", "body", "--title", title, "--category", "Work"],
        );
        assert_success(&added);
    }

    let dry = run_notekeep(&config, &["cleanup", "Work", "--dry-run", "count"]);
    assert_success(&dry);
    let report = parse_json(&dry);
    assert_eq!(report["matched"], 2);
    assert_eq!(report["deleted"], 0);

    let refused = run_notekeep(&config, &["cleanup", "Work"]);
    assert_failure(&refused);

    let executed = run_notekeep(&config, &["cleanup", "Work", "--confirm"]);
    assert_success(&executed);
    let report = parse_json(&executed);
    assert_eq!(report["deleted"], 2);
    assert!(
        report["backup"].is_string(),
        "destructive cleanup should name its snapshot: {report}"
    );

    let listed = run_notekeep(&config, &["notes", "--category", "Work"]);
    assert_success(&listed);
    assert_eq!(parse_json(&listed)["count"], 0);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn backup_create_list_prune_restore_round_trips_the_document() {
    let root = unique_workspace("notekeep-cli-backup");
    let config = setup_store(&root);

    let added = run_notekeep(&config, &["add", "precious", "--title", "keeper"]);
    assert_success(&added);

    let created = run_notekeep(&config, &["backup", "create"]);
    assert_success(&created);
    let backup_name = parse_json(&created)["file"]
        .as_str()
        .expect("create should name the backup file")
        .to_string();

    let listed = run_notekeep(&config, &["backup", "list"]);
    assert_success(&listed);
    let report = parse_json(&listed);
    assert_eq!(report["count"], 1);
    assert_eq!(report["backups"][0]["file"], backup_name.as_str());

    let cleaned = run_notekeep(&config, &["cleanup", "INBOX", "--confirm"]);
    assert_success(&cleaned);

    let restored = run_notekeep(&config, &["backup", "restore", &backup_name]);
    assert_success(&restored);
    let report = parse_json(&restored);
    assert_eq!(report["restored_from"], backup_name.as_str());
    assert!(report["pre_restore_backup"].is_string());

    let latest = run_notekeep(&config, &["latest"]);
    assert_success(&latest);
    assert_eq!(parse_json(&latest)["note"]["title"], "keeper");

    let unknown = run_notekeep(&config, &["backup", "restore", "../outside.json"]);
    assert_failure(&unknown);

    let pruned = run_notekeep(&config, &["backup", "prune", "--keep", "0"]);
    assert_success(&pruned);
    let listed = run_notekeep(&config, &["backup", "list"]);
    assert_success(&listed);
    assert_eq!(parse_json(&listed)["count"], 0);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn purge_and_config_surface_their_reports_as_json() {
    let root = unique_workspace("notekeep-cli-purge");
    let config = setup_store(&root);
    std::fs::write(root.join("old.log"), "stale").expect("log file should be writable");

    let dry = run_notekeep(&config, &["purge", "logs", "--dry-run", "list"]);
    assert_success(&dry);
    let report = parse_json(&dry);
    assert_eq!(report["matched"], 1);
    assert_eq!(report["files"][0], "old.log");

    let executed = run_notekeep(&config, &["purge", "logs", "--confirm"]);
    assert_success(&executed);
    assert_eq!(parse_json(&executed)["deleted"], 1);
    assert!(root.join("data.json").exists());

    let shown = run_notekeep(&config, &["config", "show"]);
    assert_success(&shown);
    let report = parse_json(&shown);
    assert_eq!(report["default_color"], "3478bd");

    let set = run_notekeep(&config, &["config", "set", "--utc-offset", "+13:00"]);
    assert_success(&set);
    assert_eq!(parse_json(&set)["utc_offset"], "+13:00");

    let bad = run_notekeep(&config, &["config", "set", "--utc-offset", "sideways"]);
    assert_failure(&bad);

    let _ = std::fs::remove_dir_all(&root);
}
