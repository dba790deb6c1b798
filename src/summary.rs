use crate::model::{BuildRecord, BuildResult, JobId};
use serde::{Deserialize, Serialize};

/// Wire view of a single build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub full_name: String,
    pub result: Option<BuildResult>,
    pub duration: i64,
    pub start_time_millis: i64,
    pub id: String,
    pub queue_time_millis: i64,
    pub built_on: String,
}

impl BuildSummary {
    /// Running builds report `null` as their result and the time elapsed
    /// since they started (as of `now_millis`) as their duration.
    pub fn project(job: &JobId, record: &BuildRecord, now_millis: i64) -> Self {
        let duration = if record.is_running() {
            now_millis.saturating_sub(record.start_time_millis).max(0)
        } else {
            record.duration_millis
        };

        Self {
            full_name: format!("{job} {}", record.display_name()),
            result: record.result,
            duration,
            start_time_millis: record.start_time_millis,
            id: record.number.to_string(),
            queue_time_millis: record.queue_time_millis,
            built_on: record.executor_label.clone(),
        }
    }
}
