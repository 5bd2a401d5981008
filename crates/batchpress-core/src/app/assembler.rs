//! Output assembler: consolidates a terminal job's tasks into one artifact.

use std::sync::Arc;

use tracing::info;

use super::tabular;
use crate::domain::JobId;
use crate::error::PipelineError;
use crate::ports::{ArtifactStore, RecordStore};

pub struct OutputAssembler {
    store: Arc<dyn RecordStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl OutputAssembler {
    pub fn new(store: Arc<dyn RecordStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { store, artifacts }
    }

    /// Render one output row per task, ordered by sequence number, and store
    /// the table as a single artifact. Tasks stop changing once their job is
    /// terminal, so the snapshot read here is consistent.
    pub async fn assemble(&self, job_id: JobId) -> Result<String, PipelineError> {
        let tasks = self.store.get_tasks_by_job(job_id).await?;
        let bytes = tabular::write_output(&tasks)?;
        let output_ref = self.artifacts.put(&bytes, "csv").await?;
        info!(%job_id, %output_ref, rows = tasks.len(), "assembled output table");
        Ok(output_ref)
    }
}
