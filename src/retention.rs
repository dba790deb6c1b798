use crate::build_log::{BuildLog, DirStore};
use crate::error::LogError;
use crate::model::{BuildNumber, JobId};
use log::info;
use std::time::Duration;

/// Which completed builds survive a prune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Keep at most this many of the newest builds.
    pub keep: Option<usize>,
    /// Drop builds that started longer ago than this.
    pub max_age: Option<Duration>,
}

impl Policy {
    pub fn is_unlimited(&self) -> bool {
        self.keep.is_none() && self.max_age.is_none()
    }
}

/// Deletes the builds of `job` that fall outside `policy` and returns their
/// numbers, ascending. Running builds are never deleted.
pub fn prune(
    store: &DirStore,
    job: &JobId,
    policy: &Policy,
    now_millis: i64,
) -> Result<Vec<BuildNumber>, LogError> {
    if policy.is_unlimited() {
        return Ok(Vec::new());
    }

    let cutoff = policy
        .max_age
        .map(|age| now_millis.saturating_sub(age.as_millis().min(i64::MAX as u128) as i64));

    let mut kept = 0_usize;
    let mut removed = Vec::new();

    for number in store.numbers(job)?.into_iter().rev() {
        let Some(record) = store.get_by_number(job, number)? else {
            continue;
        };

        if record.is_running() {
            continue;
        }

        let over_count = policy.keep.is_some_and(|keep| kept >= keep);
        let too_old = cutoff.is_some_and(|cutoff| record.start_time_millis < cutoff);

        if over_count || too_old {
            if store.delete(job, number)? {
                removed.push(number);
            }
        } else {
            kept += 1;
        }
    }

    removed.reverse();
    if !removed.is_empty() {
        info!("pruned {} builds from {job}", removed.len());
    }
    Ok(removed)
}
