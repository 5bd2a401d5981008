//! In-memory RecordStore implementation.
//!
//! Good enough for single-process runs and tests. Durable backends implement
//! the same trait; the aggregation path doesn't care which one it gets.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{JobId, JobRecord, TaskId, TaskRecord};
use crate::error::PipelineError;
use crate::ports::RecordStore;

struct InMemoryState {
    jobs: HashMap<JobId, JobRecord>,
    tasks: HashMap<TaskId, TaskRecord>,
}

impl InMemoryState {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            tasks: HashMap::new(),
        }
    }
}

pub struct InMemoryStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create_job(&self, job: JobRecord) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        state.jobs.insert(job.job_id, job);
        Ok(())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Option<JobRecord>, PipelineError> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&job_id).cloned())
    }

    async fn update_job(&self, job: JobRecord) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        if !state.jobs.contains_key(&job.job_id) {
            return Err(PipelineError::JobNotFound(job.job_id));
        }
        state.jobs.insert(job.job_id, job);
        Ok(())
    }

    async fn create_tasks(&self, tasks: Vec<TaskRecord>) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        for task in tasks {
            state.tasks.insert(task.task_id, task);
        }
        Ok(())
    }

    async fn get_task(&self, task_id: TaskId) -> Result<Option<TaskRecord>, PipelineError> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(&task_id).cloned())
    }

    async fn get_tasks_by_job(&self, job_id: JobId) -> Result<Vec<TaskRecord>, PipelineError> {
        let state = self.state.lock().await;
        let mut tasks: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|t| t.job_id == job_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.sequence_number);
        Ok(tasks)
    }

    async fn update_task(&self, task: TaskRecord) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        if !state.tasks.contains_key(&task.task_id) {
            return Err(PipelineError::TaskNotFound(task.task_id));
        }
        state.tasks.insert(task.task_id, task);
        Ok(())
    }
}
