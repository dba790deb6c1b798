use crate::error::LogError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Strictly increasing, never reused identifier of a build within a job.
pub type BuildNumber = u64;

static JOB_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(name: impl Into<String>) -> Result<Self, LogError> {
        let name = name.into();
        if !JOB_NAME_RE.is_match(&name) {
            return Err(LogError::InvalidJob(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
}

impl BuildResult {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Failure => "FAILURE",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Aborted => "ABORTED",
            BuildResult::NotBuilt => "NOT_BUILT",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_uppercase().replace('-', "_").as_str() {
            "SUCCESS" => Some(BuildResult::Success),
            "FAILURE" => Some(BuildResult::Failure),
            "UNSTABLE" => Some(BuildResult::Unstable),
            "ABORTED" => Some(BuildResult::Aborted),
            "NOT_BUILT" => Some(BuildResult::NotBuilt),
            _ => None,
        }
    }
}

/// One build as stored by a build log. `result` is `None` while the build runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub number: BuildNumber,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    pub result: Option<BuildResult>,
    pub start_time_millis: i64,
    pub queue_time_millis: i64,
    pub duration_millis: i64,
    #[serde(default)]
    pub executor_label: String,
}

impl BuildRecord {
    pub fn is_running(&self) -> bool {
        self.result.is_none()
    }

    pub fn display_name(&self) -> String {
        if self.display_name.trim().is_empty() {
            format!("#{}", self.number)
        } else {
            self.display_name.clone()
        }
    }
}

/// Fields of a build that does not have a number yet.
#[derive(Debug, Clone, Default)]
pub struct NewBuild {
    pub display_name: String,
    pub result: Option<BuildResult>,
    pub start_time_millis: i64,
    pub queue_time_millis: i64,
    pub duration_millis: i64,
    pub executor_label: String,
}

impl NewBuild {
    pub fn into_record(self, number: BuildNumber) -> BuildRecord {
        BuildRecord {
            number,
            display_name: self.display_name,
            result: self.result,
            start_time_millis: self.start_time_millis,
            queue_time_millis: self.queue_time_millis,
            duration_millis: self.duration_millis,
            executor_label: self.executor_label,
        }
    }
}

pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
