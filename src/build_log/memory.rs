use crate::build_log::BuildLog;
use crate::error::LogError;
use crate::model::{BuildNumber, BuildRecord, JobId, NewBuild};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

/// Thread-safe in-memory build log.
#[derive(Debug, Default)]
pub struct MemoryLog {
    jobs: RwLock<HashMap<JobId, JobBuilds>>,
}

#[derive(Debug, Default)]
struct JobBuilds {
    builds: BTreeMap<BuildNumber, BuildRecord>,
    next_number: BuildNumber,
}

impl JobBuilds {
    fn next(&self) -> BuildNumber {
        self.next_number.max(1)
    }
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next build number to `build` and stores it.
    pub fn push(&self, job: &JobId, build: NewBuild) -> BuildRecord {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let entry = jobs.entry(job.clone()).or_default();

        let number = entry.next();
        let record = build.into_record(number);
        entry.builds.insert(number, record.clone());
        entry.next_number = number.saturating_add(1);
        record
    }

    /// Stores a record under its own number. Later pushes continue above it.
    pub fn insert(&self, job: &JobId, record: BuildRecord) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let entry = jobs.entry(job.clone()).or_default();

        entry.next_number = entry.next().max(record.number.saturating_add(1));
        entry.builds.insert(record.number, record);
    }

    /// Replaces an existing record; returns false when the number is absent.
    pub fn update(&self, job: &JobId, record: BuildRecord) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs
            .get_mut(job)
            .and_then(|entry| entry.builds.get_mut(&record.number))
        {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, job: &JobId, number: BuildNumber) -> Option<BuildRecord> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.get_mut(job)
            .and_then(|entry| entry.builds.remove(&number))
    }

    pub fn len(&self, job: &JobId) -> usize {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(job).map_or(0, |entry| entry.builds.len())
    }
}

impl BuildLog for MemoryLog {
    fn highest_number(&self, job: &JobId) -> Result<Option<BuildNumber>, LogError> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(jobs
            .get(job)
            .and_then(|entry| entry.builds.last_key_value())
            .map(|(number, _)| *number))
    }

    fn get_by_number(
        &self,
        job: &JobId,
        number: BuildNumber,
    ) -> Result<Option<BuildRecord>, LogError> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(jobs
            .get(job)
            .and_then(|entry| entry.builds.get(&number))
            .cloned())
    }
}
