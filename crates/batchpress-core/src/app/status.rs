//! Read-only status and results lookups (what a thin HTTP layer would serve).

use serde::{Deserialize, Serialize};

use crate::domain::{JobId, JobState, JobStatusView, TaskState};
use crate::error::PipelineError;
use crate::ports::RecordStore;

/// One task's row in the results view. Empty derived slots render as empty
/// strings, mirroring the output table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultView {
    pub sequence_number: u32,
    pub label: String,
    pub source_refs: Vec<String>,
    pub derived_refs: Vec<String>,
    pub status: TaskState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultsView {
    pub job_id: JobId,
    pub status: JobState,
    pub total_items: u32,
    pub tasks: Vec<TaskResultView>,
    pub output_ref: Option<String>,
}

/// Progress snapshot for one job.
pub async fn job_status(
    store: &dyn RecordStore,
    job_id: JobId,
) -> Result<Option<JobStatusView>, PipelineError> {
    Ok(store.get_job(job_id).await?.as_ref().map(JobStatusView::from))
}

/// Detailed results for one job, tasks ordered by sequence number. Returns
/// `None` for unknown jobs; callers gate on terminal status if they only want
/// settled results.
pub async fn job_results(
    store: &dyn RecordStore,
    job_id: JobId,
) -> Result<Option<JobResultsView>, PipelineError> {
    let Some(job) = store.get_job(job_id).await? else {
        return Ok(None);
    };

    let tasks = store
        .get_tasks_by_job(job_id)
        .await?
        .into_iter()
        .map(|task| TaskResultView {
            sequence_number: task.sequence_number,
            label: task.label,
            source_refs: task.source_refs,
            derived_refs: task
                .derived_refs
                .into_iter()
                .map(|slot| slot.unwrap_or_default())
                .collect(),
            status: task.status,
        })
        .collect();

    Ok(Some(JobResultsView {
        job_id: job.job_id,
        status: job.status,
        total_items: job.total_items,
        tasks,
        output_ref: job.output_ref,
    }))
}
