//! RecordStore port - persistence for job and task records.
//!
//! The backend is pluggable (in-memory for tests and single-process runs, a
//! database behind the same trait in production). The contract is plain
//! read/overwrite: all mutation on the aggregation path happens under the
//! Completion Aggregator's per-job lock, which is what makes whole-record
//! updates race-free.

use async_trait::async_trait;

use crate::domain::{JobId, JobRecord, TaskId, TaskRecord};
use crate::error::PipelineError;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_job(&self, job: JobRecord) -> Result<(), PipelineError>;

    async fn get_job(&self, job_id: JobId) -> Result<Option<JobRecord>, PipelineError>;

    /// Overwrite an existing job record.
    async fn update_job(&self, job: JobRecord) -> Result<(), PipelineError>;

    async fn create_tasks(&self, tasks: Vec<TaskRecord>) -> Result<(), PipelineError>;

    async fn get_task(&self, task_id: TaskId) -> Result<Option<TaskRecord>, PipelineError>;

    /// All tasks of a job, ordered by `sequence_number` ascending.
    async fn get_tasks_by_job(&self, job_id: JobId) -> Result<Vec<TaskRecord>, PipelineError>;

    /// Overwrite an existing task record.
    async fn update_task(&self, task: TaskRecord) -> Result<(), PipelineError>;
}
