//! Task dispatcher: batch in, job out, units launched.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::aggregator::Aggregator;
use super::config::PipelineConfig;
use super::worker::{run_unit, UnitContext};
use crate::domain::{JobId, JobRecord, RawRow, RowDescriptor, TaskRecord};
use crate::error::PipelineError;
use crate::ports::{ArtifactStore, Clock, IdGenerator, ImageFetcher, ImageTransformer, RecordStore};

pub struct Dispatcher {
    store: Arc<dyn RecordStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    unit_ctx: Arc<UnitContext>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn RecordStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        fetcher: Arc<dyn ImageFetcher>,
        transformer: Arc<dyn ImageTransformer>,
        artifacts: Arc<dyn ArtifactStore>,
        aggregator: Arc<Aggregator>,
        config: &PipelineConfig,
    ) -> Self {
        let unit_ctx = Arc::new(UnitContext {
            fetcher,
            transformer,
            artifacts,
            aggregator,
            retry: config.report_retry.clone(),
        });
        Self {
            store,
            ids,
            clock,
            unit_ctx,
            permits: Arc::new(Semaphore::new(config.max_concurrent_units)),
        }
    }

    /// Create a job from a parsed batch and launch one unit per
    /// `(task, index)` pair. Returns as soon as everything is spawned; no unit
    /// is awaited here.
    ///
    /// Invalid rows are logged and skipped without counting toward
    /// `total_items`. A batch with zero valid rows produces a job that is
    /// immediately terminal (`Failed`) with no units launched, so callers
    /// always get a job id they can poll.
    pub async fn submit(
        &self,
        rows: Vec<RawRow>,
        callback_target: Option<String>,
        source_name: Option<String>,
    ) -> Result<JobId, PipelineError> {
        let now = self.clock.now();
        let job_id = self.ids.job_id();

        let mut job = JobRecord::new(job_id, callback_target, now);
        if let Some(name) = source_name {
            job = job.with_source_name(name);
        }
        self.store.create_job(job.clone()).await?;

        let mut valid = Vec::new();
        for (line, raw) in rows.iter().enumerate() {
            match RowDescriptor::parse(raw) {
                Some(row) => valid.push(row),
                None => warn!(%job_id, line, row = ?raw, "invalid row skipped"),
            }
        }

        if valid.is_empty() {
            warn!(%job_id, "batch has no valid rows, failing job");
            job.mark_failed(now);
            self.store.update_job(job.clone()).await?;
            // Terminal is terminal: a registered callback target hears about
            // a rejected batch the same as a completed one.
            self.unit_ctx.aggregator.notify_terminal(&job).await;
            return Ok(job_id);
        }

        job.begin(valid.len() as u32, now);
        self.store.update_job(job).await?;

        let mut tasks = Vec::with_capacity(valid.len());
        for row in valid {
            let mut task = TaskRecord::new(self.ids.task_id(), job_id, row, now);
            task.begin(now);
            tasks.push(task);
        }
        self.store.create_tasks(tasks.clone()).await?;

        let mut units = 0;
        for task in &tasks {
            for (index, url) in task.source_refs.iter().enumerate() {
                tokio::spawn(run_unit(
                    self.unit_ctx.clone(),
                    self.permits.clone(),
                    job_id,
                    task.task_id,
                    index,
                    url.clone(),
                ));
                units += 1;
            }
        }

        info!(%job_id, tasks = tasks.len(), units, "batch dispatched");
        Ok(job_id)
    }
}
