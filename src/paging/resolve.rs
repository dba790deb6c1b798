use crate::build_log::BuildLog;
use crate::error::LogError;
use crate::model::{BuildNumber, BuildRecord, JobId};
use crate::paging::Order;
use crate::range::NumberRange;
use log::debug;

/// Looks up every number of `range` and keeps the ones that exist, in `order`.
pub fn resolve<L: BuildLog + ?Sized>(
    log: &L,
    job: &JobId,
    range: &NumberRange,
    order: Order,
) -> Result<Vec<BuildRecord>, LogError> {
    resolve_first(log, job, range, order, usize::MAX)
}

/// Like [`resolve`], but stops reading once `limit` records were found.
pub fn resolve_first<L: BuildLog + ?Sized>(
    log: &L,
    job: &JobId,
    range: &NumberRange,
    order: Order,
    limit: usize,
) -> Result<Vec<BuildRecord>, LogError> {
    let numbers: Box<dyn Iterator<Item = BuildNumber> + '_> = match order {
        Order::NewestFirst => Box::new(range.iter_desc()),
        Order::OldestFirst => Box::new(range.iter_asc()),
    };

    let mut records = Vec::new();
    for number in numbers {
        if records.len() >= limit {
            break;
        }
        if let Some(record) = log.get_by_number(job, number)? {
            records.push(record);
        }
    }

    debug!(
        "resolve {job} [{range}]: {} of {} present",
        records.len(),
        range.len()
    );
    Ok(records)
}

/// Number of builds in `range` that still exist.
pub fn count<L: BuildLog + ?Sized>(
    log: &L,
    job: &JobId,
    range: &NumberRange,
) -> Result<usize, LogError> {
    let mut present = 0;
    for number in range.iter_asc() {
        if log.get_by_number(job, number)?.is_some() {
            present += 1;
        }
    }
    Ok(present)
}
