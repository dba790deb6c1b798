use crate::build_log::BuildLog;
use crate::error::LogError;
use crate::model::{BuildNumber, BuildRecord, JobId, NewBuild};
use log::warn;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT: &str = ".buildpager";

const BUILDS_DIR: &str = "builds";
const NEXT_NUMBER_FILE: &str = "nextBuildNumber";

/// Build log persisted as one JSON file per build:
/// `<root>/<job>/builds/<number>.json`, plus `<root>/<job>/nextBuildNumber`
/// so that numbers of deleted builds are never handed out again.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn append(&self, job: &JobId, build: NewBuild) -> Result<BuildRecord, LogError> {
        let builds_dir = self.builds_dir(job);
        fs::create_dir_all(&builds_dir)
            .map_err(|e| LogError::io("create builds directory", &builds_dir, e))?;

        let number = self.next_number(job)?;
        let record = build.into_record(number);
        self.write_record(job, &record)?;

        let next_path = self.job_dir(job).join(NEXT_NUMBER_FILE);
        fs::write(&next_path, format!("{}\n", number.saturating_add(1)))
            .map_err(|e| LogError::io("write next build number", &next_path, e))?;

        Ok(record)
    }

    /// Rewrites an existing build in place. Returns false when it is absent.
    pub fn update(&self, job: &JobId, record: &BuildRecord) -> Result<bool, LogError> {
        if !self.record_path(job, record.number).exists() {
            return Ok(false);
        }
        self.write_record(job, record)?;
        Ok(true)
    }

    pub fn delete(&self, job: &JobId, number: BuildNumber) -> Result<bool, LogError> {
        let path = self.record_path(job, number);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(LogError::io("delete build record", path, err)),
        }
    }

    /// Every build number present for `job`, ascending. Reads directory
    /// entries only; meant for maintenance, not for serving pages.
    pub fn numbers(&self, job: &JobId) -> Result<Vec<BuildNumber>, LogError> {
        let mut numbers = Vec::new();
        self.scan_numbers(job, |number| numbers.push(number))?;
        numbers.sort_unstable();
        Ok(numbers)
    }

    pub fn jobs(&self) -> Result<Vec<JobId>, LogError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(LogError::io("read store directory", &self.root, err)),
        };

        let mut jobs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LogError::io("read store directory", &self.root, e))?;
            if !entry.path().join(BUILDS_DIR).is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Ok(job) = JobId::new(name) {
                jobs.push(job);
            }
        }

        jobs.sort();
        Ok(jobs)
    }

    fn next_number(&self, job: &JobId) -> Result<BuildNumber, LogError> {
        let path = self.job_dir(job).join(NEXT_NUMBER_FILE);
        let recorded = match fs::read_to_string(&path) {
            Ok(text) => text
                .trim()
                .parse::<BuildNumber>()
                .map_err(|e| LogError::Corrupt {
                    path: path.clone(),
                    detail: format!("next build number {:?}: {e}", text.trim()),
                })?,
            Err(err) if err.kind() == ErrorKind::NotFound => 1,
            Err(err) => return Err(LogError::io("read next build number", path, err)),
        };

        let above_highest = self.highest_number(job)?.map_or(1, |n| n.saturating_add(1));
        Ok(recorded.max(above_highest).max(1))
    }

    fn write_record(&self, job: &JobId, record: &BuildRecord) -> Result<(), LogError> {
        let path = self.record_path(job, record.number);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp, bytes).map_err(|e| LogError::io("write build record", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| LogError::io("write build record", &path, e))
    }

    fn scan_numbers(
        &self,
        job: &JobId,
        mut visit: impl FnMut(BuildNumber),
    ) -> Result<(), LogError> {
        let dir = self.builds_dir(job);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(LogError::io("read builds directory", dir, err)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| LogError::io("read builds directory", &dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(number) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<BuildNumber>().ok())
            else {
                continue;
            };
            if number > 0 {
                visit(number);
            }
        }

        Ok(())
    }

    fn job_dir(&self, job: &JobId) -> PathBuf {
        self.root.join(job.as_str())
    }

    fn builds_dir(&self, job: &JobId) -> PathBuf {
        self.job_dir(job).join(BUILDS_DIR)
    }

    fn record_path(&self, job: &JobId, number: BuildNumber) -> PathBuf {
        self.builds_dir(job).join(format!("{number}.json"))
    }
}

impl BuildLog for DirStore {
    fn highest_number(&self, job: &JobId) -> Result<Option<BuildNumber>, LogError> {
        let mut highest = None;
        self.scan_numbers(job, |number| {
            highest = Some(highest.map_or(number, |h: BuildNumber| h.max(number)));
        })?;
        Ok(highest)
    }

    fn get_by_number(
        &self,
        job: &JobId,
        number: BuildNumber,
    ) -> Result<Option<BuildRecord>, LogError> {
        let path = self.record_path(job, number);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LogError::io("read build record", path, err)),
        };

        match serde_json::from_str::<BuildRecord>(&text) {
            Ok(record) if record.number == number => Ok(Some(record)),
            Ok(record) => {
                warn!(
                    "{} holds build #{} instead of #{number}; skipping",
                    path.display(),
                    record.number
                );
                Ok(None)
            }
            Err(err) => {
                warn!("skipping malformed build record {}: {err}", path.display());
                Ok(None)
            }
        }
    }
}
