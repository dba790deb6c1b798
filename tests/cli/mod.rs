use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn buildpager(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("buildpager");
    cmd.current_dir(dir).env("NO_COLOR", "1");
    cmd
}

fn record(dir: &Path, job: &str, count: usize) {
    for idx in 0..count {
        let start = 1_700_000_000_000_i64 + idx as i64 * 60_000;
        buildpager(dir)
            .args([
                "record",
                job,
                "--result",
                "success",
                "--duration",
                "1500",
                "--start-time",
                &start.to_string(),
                "--queue-time",
                &(start - 200).to_string(),
            ])
            .assert()
            .success();
    }
}

fn page_json(dir: &Path, args: &[&str]) -> Value {
    let out = buildpager(dir)
        .arg("page")
        .args(args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("page json")
}

fn page_ids(page: &Value) -> Vec<String> {
    page["builds"]
        .as_array()
        .expect("builds array")
        .iter()
        .map(|build| build["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn page_json_matches_wire_shape() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 10);

    let page = page_json(dir.path(), &["TestJob", "--size", "5"]);
    assert_eq!(page["count"], 5);
    assert_eq!(page_ids(&page), vec!["10", "9", "8", "7", "6"]);

    let first = &page["builds"][0];
    assert_eq!(first["fullName"], "TestJob #10");
    assert_eq!(first["result"], "SUCCESS");
    assert_eq!(first["duration"], 1500);
    assert_eq!(first["builtOn"], "");
    assert!(first["startTimeMillis"].as_i64() > first["queueTimeMillis"].as_i64());
}

#[test]
fn page_oldest_first_pages_from_build_one() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 10);

    let page = page_json(
        dir.path(),
        &["TestJob", "--start", "6", "--size", "2", "--order", "oldest-first"],
    );
    assert_eq!(page_ids(&page), vec!["6", "7"]);
}

#[test]
fn deleted_builds_are_skipped() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 6);

    buildpager(dir.path())
        .args(["delete", "TestJob", "5"])
        .assert()
        .success();
    buildpager(dir.path())
        .args(["delete", "TestJob", "5"])
        .assert()
        .failure()
        .code(2);

    let page = page_json(dir.path(), &["TestJob", "--size", "3"]);
    assert_eq!(page_ids(&page), vec!["6", "4", "3"]);
}

#[test]
fn page_rejects_non_positive_start() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 1);

    buildpager(dir.path())
        .args(["page", "TestJob", "--start", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("start must be >= 1"));

    buildpager(dir.path())
        .args(["page", "TestJob", "--size", "-2"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("size must be >= 1"));
}

#[test]
fn page_of_unknown_job_is_empty() {
    let dir = tempdir().expect("tempdir");

    let page = page_json(dir.path(), &["NoSuchJob"]);
    assert_eq!(page["count"], 0);
    assert_eq!(page["builds"].as_array().map(Vec::len), Some(0));

    buildpager(dir.path())
        .args(["page", "NoSuchJob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No builds at this position"));
}

#[test]
fn resolve_reports_present_numbers() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 8);
    buildpager(dir.path())
        .args(["delete", "TestJob", "3"])
        .assert()
        .success();

    let out = buildpager(dir.path())
        .args(["resolve", "TestJob", "1-5,12", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).expect("resolve json");
    assert_eq!(parsed["requested"], "1-5,12");
    assert_eq!(parsed["resolved"], "1-2,4-5");
    assert_eq!(parsed["count"], 4);

    buildpager(dir.path())
        .args(["resolve", "TestJob", "5-1"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn running_build_can_be_finished() {
    let dir = tempdir().expect("tempdir");

    buildpager(dir.path())
        .args(["record", "TestJob", "--running", "--node", "agent-7"])
        .assert()
        .success();

    let page = page_json(dir.path(), &["TestJob"]);
    assert!(page["builds"][0]["result"].is_null());
    assert_eq!(page["builds"][0]["builtOn"], "agent-7");

    buildpager(dir.path())
        .args(["finish", "TestJob", "1", "--result", "unstable", "--duration", "42"])
        .assert()
        .success();

    let page = page_json(dir.path(), &["TestJob"]);
    assert_eq!(page["builds"][0]["result"], "UNSTABLE");
    assert_eq!(page["builds"][0]["duration"], 42);
}

#[test]
fn prune_keeps_newest_builds() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 5);

    let out = buildpager(dir.path())
        .args(["prune", "TestJob", "--keep", "2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let removed: Vec<u64> = serde_json::from_slice(&out).expect("prune json");
    assert_eq!(removed, vec![1, 2, 3]);

    let page = page_json(dir.path(), &["TestJob"]);
    assert_eq!(page_ids(&page), vec!["5", "4"]);

    buildpager(dir.path())
        .args(["prune", "TestJob"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn jobs_lists_recorded_jobs() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "beta", 2);
    record(dir.path(), "alpha", 1);

    let out = buildpager(dir.path())
        .args(["jobs", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).expect("jobs json");
    assert_eq!(parsed[0]["name"], "alpha");
    assert_eq!(parsed[1]["name"], "beta");
    assert_eq!(parsed[1]["builds"], 2);
    assert_eq!(parsed[1]["latest"], 2);
}

#[test]
fn config_sets_default_page_size_and_store() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("buildpager.yml"),
        r#"version: 1
store:
  root: "history"
paging:
  default_size: 3
"#,
    )
    .expect("write config");

    record(dir.path(), "TestJob", 5);
    assert!(dir.path().join("history/TestJob/builds/5.json").exists());

    let page = page_json(dir.path(), &["TestJob"]);
    assert_eq!(page_ids(&page), vec!["5", "4", "3"]);
}

#[test]
fn configured_max_size_caps_served_pages() {
    let dir = tempdir().expect("tempdir");
    record(dir.path(), "TestJob", 6);

    let page = page_json(dir.path(), &["TestJob", "--size", "50"]);
    assert_eq!(page["count"], 6);

    fs::write(
        dir.path().join("buildpager.yml"),
        "version: 1\npaging:\n  max_size: 4\n  default_size: 2\n",
    )
    .expect("write config");

    let page = page_json(dir.path(), &["TestJob", "--size", "50"]);
    assert_eq!(page_ids(&page), vec!["6", "5", "4", "3"]);
}

#[test]
fn init_writes_a_valid_config() {
    let dir = tempdir().expect("tempdir");

    buildpager(dir.path()).arg("init").assert().success();
    buildpager(dir.path()).arg("init").assert().failure().code(2);

    let out = buildpager(dir.path())
        .args(["validate", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&out).expect("validate json");
    assert_eq!(parsed["valid"], true);
    assert_eq!(parsed["config"], "./buildpager.yml");
}

#[test]
fn validate_json_reports_invalid_config_and_fails() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("buildpager.yml"),
        r#"version: 1
paging:
  order: sideways
"#,
    )
    .expect("write config");

    let out = buildpager(dir.path())
        .args(["validate", "--json"])
        .assert()
        .failure()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let parsed: Value = serde_json::from_slice(&out).expect("validate json");
    assert_eq!(parsed["valid"], false);
    assert_eq!(parsed["issues"][0]["field"], "paging.order");
    assert!(parsed["error"].as_str().is_some());
}

#[test]
fn invalid_job_name_is_a_usage_error() {
    let dir = tempdir().expect("tempdir");

    buildpager(dir.path())
        .args(["page", "../escape"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid job name"));
}
