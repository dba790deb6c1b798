use crate::support::job;
use buildpager::build_log::{BuildLog, DirStore};
use buildpager::model::{BuildResult, NewBuild};
use buildpager::paging::{PageRequest, Paginator};
use buildpager::retention::{Policy, prune};
use std::time::Duration;
use tempfile::tempdir;

const DAY_MS: i64 = 24 * 60 * 60 * 1_000;

fn build(start: i64, result: Option<BuildResult>) -> NewBuild {
    NewBuild {
        result,
        start_time_millis: start,
        queue_time_millis: start,
        duration_millis: 10,
        ..NewBuild::default()
    }
}

#[test]
fn keep_prunes_oldest_builds() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");
    for day in 0..6 {
        store
            .append(&job, build(day * DAY_MS, Some(BuildResult::Success)))
            .expect("append");
    }

    let policy = Policy {
        keep: Some(3),
        max_age: None,
    };
    let removed = prune(&store, &job, &policy, 6 * DAY_MS).expect("prune");
    assert_eq!(removed, vec![1, 2, 3]);
    assert_eq!(store.numbers(&job).expect("numbers"), vec![4, 5, 6]);
}

#[test]
fn max_age_prunes_by_start_time_and_spares_running_builds() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");

    store.append(&job, build(0, None)).expect("append");
    store
        .append(&job, build(DAY_MS, Some(BuildResult::Failure)))
        .expect("append");
    store
        .append(&job, build(9 * DAY_MS, Some(BuildResult::Success)))
        .expect("append");

    let policy = Policy {
        keep: None,
        max_age: Some(Duration::from_secs(7 * 24 * 60 * 60)),
    };
    let removed = prune(&store, &job, &policy, 10 * DAY_MS).expect("prune");
    assert_eq!(removed, vec![2]);
    assert!(store.get_by_number(&job, 1).expect("get").is_some());
}

#[test]
fn unlimited_policy_keeps_everything() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");
    store.append(&job, build(0, Some(BuildResult::Success))).expect("append");

    let removed = prune(&store, &job, &Policy::default(), DAY_MS).expect("prune");
    assert!(removed.is_empty());
}

#[test]
fn paging_survives_pruned_gaps() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    let job = job("TestJob");
    for n in 0..10 {
        store
            .append(&job, build(n * 1_000, Some(BuildResult::Success)))
            .expect("append");
    }
    store.delete(&job, 9).expect("delete");
    store.delete(&job, 8).expect("delete");

    let policy = Policy {
        keep: Some(6),
        max_age: None,
    };
    prune(&store, &job, &policy, 20_000).expect("prune");

    let page = Paginator::new()
        .page(&store, &job, &PageRequest::new(1, 10))
        .expect("page");
    let ids: Vec<&str> = page.builds.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["10", "7", "6", "5", "4", "3"]);
}
