use thiserror::Error;

use crate::domain::{JobId, TaskId};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("derived slot {index} out of range for task {task_id} (len={len})")]
    SlotOutOfRange {
        task_id: TaskId,
        index: usize,
        len: usize,
    },

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("artifact io: {0}")]
    Artifact(#[from] std::io::Error),

    #[error("callback delivery to {target} failed: {reason}")]
    Callback { target: String, reason: String },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}
