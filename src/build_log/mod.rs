//! Read access to a job's build history.
//!
//! Paging only ever asks two questions of a log: which number is the highest
//! one present, and what record (if any) lives at a given number. Numbers may
//! be missing at any point because builds get deleted, so an absent record is
//! an ordinary answer and not an error.

mod memory;
mod store;

pub use memory::MemoryLog;
pub use store::{DEFAULT_ROOT, DirStore};

use crate::error::LogError;
use crate::model::{BuildNumber, BuildRecord, JobId};
use std::sync::Arc;

pub trait BuildLog {
    fn highest_number(&self, job: &JobId) -> Result<Option<BuildNumber>, LogError>;

    fn get_by_number(
        &self,
        job: &JobId,
        number: BuildNumber,
    ) -> Result<Option<BuildRecord>, LogError>;
}

impl<T: BuildLog + ?Sized> BuildLog for &T {
    fn highest_number(&self, job: &JobId) -> Result<Option<BuildNumber>, LogError> {
        (**self).highest_number(job)
    }

    fn get_by_number(
        &self,
        job: &JobId,
        number: BuildNumber,
    ) -> Result<Option<BuildRecord>, LogError> {
        (**self).get_by_number(job, number)
    }
}

impl<T: BuildLog + ?Sized> BuildLog for Arc<T> {
    fn highest_number(&self, job: &JobId) -> Result<Option<BuildNumber>, LogError> {
        (**self).highest_number(job)
    }

    fn get_by_number(
        &self,
        job: &JobId,
        number: BuildNumber,
    ) -> Result<Option<BuildRecord>, LogError> {
        (**self).get_by_number(job, number)
    }
}
