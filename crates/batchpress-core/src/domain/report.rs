//! Unit reports: what a fetch-transform unit tells the aggregator.

use serde::{Deserialize, Serialize};

use super::ids::{JobId, TaskId};

/// Outcome of one fetch-transform attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOutcome {
    Success { derived_ref: String },
    Failure { reason: String },
}

/// One unit's report, identified by `(task_id, index)`. Each unit reports
/// exactly once; the aggregator tolerates duplicates from the retry path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub index: usize,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    pub fn success(job_id: JobId, task_id: TaskId, index: usize, derived_ref: String) -> Self {
        Self {
            job_id,
            task_id,
            index,
            outcome: UnitOutcome::Success { derived_ref },
        }
    }

    pub fn failure(job_id: JobId, task_id: TaskId, index: usize, reason: String) -> Self {
        Self {
            job_id,
            task_id,
            index,
            outcome: UnitOutcome::Failure { reason },
        }
    }
}
