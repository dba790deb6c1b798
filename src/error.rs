use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a build log implementation.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt {}: {detail}", .path.display())]
    Corrupt { path: PathBuf, detail: String },

    #[error("encode build record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid job name {0:?}")]
    InvalidJob(String),

    #[error("build log unavailable: {0}")]
    Unavailable(String),
}

impl LogError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("{name} must be >= 1 (got {value})")]
    InvalidParameter { name: &'static str, value: i64 },

    #[error(transparent)]
    Log(#[from] LogError),
}
