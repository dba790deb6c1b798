use crate::support::{finished, job};
use buildpager::build_log::{BuildLog, DirStore, MemoryLog};
use buildpager::error::LogError;
use buildpager::model::{BuildResult, JobId, NewBuild};
use std::fs;
use tempfile::tempdir;

fn success_build(start: i64) -> NewBuild {
    NewBuild {
        result: Some(BuildResult::Success),
        start_time_millis: start,
        queue_time_millis: start - 10,
        duration_millis: 100,
        ..NewBuild::default()
    }
}

#[test]
fn job_names_are_validated() {
    assert!(JobId::new("TestJob").is_ok());
    assert!(JobId::new("team.api-build_2").is_ok());
    assert!(matches!(JobId::new("../etc"), Err(LogError::InvalidJob(_))));
    assert!(JobId::new("").is_err());
    assert!(JobId::new("has space").is_err());
}

#[test]
fn store_assigns_increasing_numbers() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");

    assert_eq!(store.highest_number(&job).expect("highest"), None);

    for expected in 1..=3 {
        let record = store.append(&job, success_build(1_000)).expect("append");
        assert_eq!(record.number, expected);
    }

    assert_eq!(store.highest_number(&job).expect("highest"), Some(3));
    let record = store
        .get_by_number(&job, 2)
        .expect("get")
        .expect("build 2 exists");
    assert_eq!(record.result, Some(BuildResult::Success));
    assert_eq!(record.display_name(), "#2");
}

#[test]
fn store_never_reuses_deleted_numbers() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");

    store.append(&job, success_build(1)).expect("append");
    store.append(&job, success_build(2)).expect("append");
    assert!(store.delete(&job, 2).expect("delete"));
    assert!(!store.delete(&job, 2).expect("delete twice"));

    let next = store.append(&job, success_build(3)).expect("append");
    assert_eq!(next.number, 3);
    assert_eq!(store.numbers(&job).expect("numbers"), vec![1, 3]);
    assert_eq!(store.get_by_number(&job, 2).expect("get"), None);
}

#[test]
fn store_updates_running_build_in_place() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");

    let mut record = store
        .append(
            &job,
            NewBuild {
                start_time_millis: 5_000,
                ..NewBuild::default()
            },
        )
        .expect("append");
    assert!(record.is_running());

    record.result = Some(BuildResult::Failure);
    record.duration_millis = 1_234;
    assert!(store.update(&job, &record).expect("update"));

    let stored = store.get_by_number(&job, 1).expect("get").expect("exists");
    assert_eq!(stored, record);

    let mut missing = record.clone();
    missing.number = 9;
    assert!(!store.update(&job, &missing).expect("update missing"));
}

#[test]
fn store_skips_malformed_records() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");

    store.append(&job, success_build(1)).expect("append");
    store.append(&job, success_build(2)).expect("append");
    fs::write(dir.path().join("TestJob/builds/2.json"), "{bad").expect("corrupt");

    assert_eq!(store.get_by_number(&job, 2).expect("get"), None);
    assert!(store.get_by_number(&job, 1).expect("get").is_some());
}

#[test]
fn store_lists_jobs() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path().join("missing"));
    assert!(store.jobs().expect("jobs").is_empty());

    let store = DirStore::new(dir.path());
    store.append(&job("beta"), success_build(1)).expect("append");
    store.append(&job("alpha"), success_build(1)).expect("append");
    fs::create_dir_all(dir.path().join("stray")).expect("stray dir");

    let names: Vec<String> = store
        .jobs()
        .expect("jobs")
        .iter()
        .map(|job| job.to_string())
        .collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn memory_log_tracks_gaps() {
    let log = MemoryLog::new();
    let job = job("TestJob");

    log.insert(&job, finished(4));
    let pushed = log.push(&job, NewBuild::default());
    assert_eq!(pushed.number, 5);

    assert_eq!(log.highest_number(&job).expect("highest"), Some(5));
    assert!(log.get_by_number(&job, 3).expect("get").is_none());

    assert!(log.remove(&job, 5).is_some());
    assert_eq!(log.highest_number(&job).expect("highest"), Some(4));
    assert_eq!(log.push(&job, NewBuild::default()).number, 6);

    let mut updated = finished(4);
    updated.result = Some(BuildResult::Aborted);
    assert!(log.update(&job, updated));
    assert!(!log.update(&job, finished(42)));
    assert_eq!(log.len(&job), 2);
}

#[test]
fn store_refuses_unreadable_next_number() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");

    for start in 1..=3 {
        store.append(&job, success_build(start)).expect("append");
    }
    assert!(store.delete(&job, 3).expect("delete"));
    fs::write(dir.path().join("TestJob/nextBuildNumber"), "three\n").expect("corrupt counter");

    let err = store
        .append(&job, success_build(4))
        .expect_err("counter is unreadable");
    assert!(matches!(err, LogError::Corrupt { .. }), "{err}");
    assert!(err.to_string().contains("nextBuildNumber"));
    assert_eq!(store.numbers(&job).expect("numbers"), vec![1, 2]);
}

#[test]
fn memory_log_accepts_the_largest_number() {
    let log = MemoryLog::new();
    let job = job("TestJob");

    log.insert(&job, finished(u64::MAX));
    assert_eq!(log.highest_number(&job).expect("highest"), Some(u64::MAX));

    log.remove(&job, u64::MAX);
    let pushed = log.push(&job, NewBuild::default());
    assert_eq!(pushed.number, u64::MAX);
}
