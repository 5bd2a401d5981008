//! Completion aggregator: the fan-in state machine.
//!
//! Every unit outcome funnels through `handle_report`, which serializes all
//! mutation of a job and its tasks behind a per-job lock. That lock is the
//! single synchronization point of the pipeline: two units of the same job can
//! never double-count `processed_items` or both trigger output assembly, while
//! units of different jobs never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::assembler::OutputAssembler;
use super::notifier::Notifier;
use crate::domain::{JobId, UnitOutcome, UnitReport};
use crate::error::PipelineError;
use crate::ports::{Clock, RecordStore};

pub struct Aggregator {
    store: Arc<dyn RecordStore>,
    assembler: OutputAssembler,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    job_locks: Mutex<HashMap<JobId, Arc<Mutex<()>>>>,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        assembler: OutputAssembler,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            assembler,
            notifier,
            clock,
            job_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn job_lock(&self, job_id: JobId) -> Arc<Mutex<()>> {
        let mut locks = self.job_locks.lock().await;
        locks
            .entry(job_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn drop_job_lock(&self, job_id: JobId) {
        self.job_locks.lock().await.remove(&job_id);
    }

    /// Notify the submitter about a job that turned terminal outside the
    /// report path (a batch rejected at submission has no units to report).
    pub async fn notify_terminal(&self, job: &crate::domain::JobRecord) {
        self.notifier.notify(job).await;
    }

    /// Process one unit outcome to completion.
    ///
    /// Progress granularity is per task: `processed_items` moves exactly once,
    /// when the owning task first turns terminal, so it always tops out at
    /// `total_items` (the task count). Errors bubble to the caller; the worker
    /// redelivers the same report, and everything here tolerates redelivery.
    pub async fn handle_report(&self, report: UnitReport) -> Result<(), PipelineError> {
        let lock = self.job_lock(report.job_id).await;
        let _guard = lock.lock().await;

        let now = self.clock.now();

        let Some(mut job) = self.store.get_job(report.job_id).await? else {
            return Err(PipelineError::JobNotFound(report.job_id));
        };
        if job.status.is_terminal() {
            // Late unit of a failed task, or a redelivered report. The
            // terminal snapshot is immutable, so drop it.
            debug!(job_id = %job.job_id, task_id = %report.task_id, "report for terminal job dropped");
            return Ok(());
        }

        let Some(mut task) = self.store.get_task(report.task_id).await? else {
            return Err(PipelineError::TaskNotFound(report.task_id));
        };
        let was_terminal = task.status.is_terminal();

        match report.outcome {
            UnitOutcome::Success { derived_ref } => {
                task.fill_slot(report.index, derived_ref, now)?;
                if !was_terminal && task.all_slots_filled() {
                    task.mark_completed(now);
                }
            }
            UnitOutcome::Failure { reason } => {
                // First failure fails the whole task; other slots may still
                // fill afterwards, but the status is settled.
                warn!(
                    job_id = %job.job_id,
                    task_id = %task.task_id,
                    index = report.index,
                    %reason,
                    "unit failed"
                );
                task.mark_failed(now);
            }
        }
        let newly_terminal = !was_terminal && task.status.is_terminal();
        self.store.update_task(task).await?;

        if newly_terminal {
            job.record_task_done(now);
        } else {
            job.touch(now);
        }
        self.store.update_job(job.clone()).await?;

        // Recomputed from the record rather than from `newly_terminal`, so a
        // redelivered report can finish the terminal transition if assembly
        // failed mid-way last time.
        if job.all_tasks_done() && !job.status.is_terminal() {
            let output_ref = self.assembler.assemble(job.job_id).await?;
            job.mark_completed(output_ref, now);
            self.store.update_job(job.clone()).await?;
            info!(
                job_id = %job.job_id,
                total_items = job.total_items,
                output_ref = job.output_ref.as_deref().unwrap_or(""),
                "job completed"
            );
            self.notifier.notify(&job).await;
            self.drop_job_lock(job.job_id).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobRecord, JobState, RowDescriptor, TaskId, TaskRecord, TaskState};
    use crate::error::PipelineError;
    use crate::ports::{ArtifactStore, CallbackPayload, CallbackSink, SystemClock};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ulid::Ulid;

    /// Artifact store that keeps everything in a map and counts writes, so
    /// tests can assert how many times assembly actually ran.
    #[derive(Default)]
    struct CountingArtifacts {
        puts: AtomicUsize,
        blobs: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ArtifactStore for CountingArtifacts {
        async fn put(&self, bytes: &[u8], ext: &str) -> Result<String, PipelineError> {
            let n = self.puts.fetch_add(1, Ordering::SeqCst);
            let name = format!("artifact-{n}.{ext}");
            self.blobs.lock().await.insert(name.clone(), bytes.to_vec());
            Ok(name)
        }

        async fn get(&self, artifact_ref: &str) -> Result<Vec<u8>, PipelineError> {
            self.blobs
                .lock()
                .await
                .get(artifact_ref)
                .cloned()
                .ok_or_else(|| PipelineError::Other(format!("missing {artifact_ref}")))
        }
    }

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CallbackSink for CountingSink {
        async fn deliver(
            &self,
            _target: &str,
            _payload: &CallbackPayload,
        ) -> Result<(), PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        artifacts: Arc<CountingArtifacts>,
        sink: Arc<CountingSink>,
        aggregator: Arc<Aggregator>,
    }

    /// One job with `slots_per_task.len()` tasks; task i has slots_per_task[i]
    /// source urls. Returns the fixture plus the job and task ids.
    async fn fixture(
        slots_per_task: &[usize],
        callback_target: Option<&str>,
    ) -> (Fixture, JobId, Vec<TaskId>) {
        let store = Arc::new(InMemoryStore::new());
        let artifacts = Arc::new(CountingArtifacts::default());
        let sink = Arc::new(CountingSink::default());

        let now = Utc::now();
        let job_id = JobId::from_ulid(Ulid::new());
        let mut job = JobRecord::new(job_id, callback_target.map(str::to_string), now);
        job.begin(slots_per_task.len() as u32, now);
        store.create_job(job).await.unwrap();

        let mut task_ids = Vec::new();
        let mut tasks = Vec::new();
        for (i, &slots) in slots_per_task.iter().enumerate() {
            let task_id = TaskId::from_ulid(Ulid::new());
            let row = RowDescriptor {
                sequence_number: (i + 1) as u32,
                label: format!("SKU-{}", i + 1),
                source_refs: (0..slots).map(|s| format!("in-{i}-{s}")).collect(),
            };
            let mut task = TaskRecord::new(task_id, job_id, row, now);
            task.begin(now);
            tasks.push(task);
            task_ids.push(task_id);
        }
        store.create_tasks(tasks).await.unwrap();

        let aggregator = Arc::new(Aggregator::new(
            store.clone(),
            OutputAssembler::new(store.clone(), artifacts.clone()),
            Notifier::new(sink.clone()),
            Arc::new(SystemClock),
        ));

        (
            Fixture {
                store,
                artifacts,
                sink,
                aggregator,
            },
            job_id,
            task_ids,
        )
    }

    #[tokio::test]
    async fn two_row_batch_completes_after_all_units() {
        // row1: 2 urls, row2: 1 url
        let (fx, job_id, tasks) = fixture(&[2, 1], None).await;

        fx.aggregator
            .handle_report(UnitReport::success(job_id, tasks[0], 0, "out-0-0".into()))
            .await
            .unwrap();
        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobState::Processing);
        assert_eq!(job.processed_items, 0);

        fx.aggregator
            .handle_report(UnitReport::success(job_id, tasks[1], 0, "out-1-0".into()))
            .await
            .unwrap();
        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.processed_items, 1);

        fx.aggregator
            .handle_report(UnitReport::success(job_id, tasks[0], 1, "out-0-1".into()))
            .await
            .unwrap();

        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobState::Completed);
        assert_eq!(job.processed_items, 2);
        assert!(job.output_ref.is_some());

        let text = String::from_utf8(
            fx.artifacts
                .get(job.output_ref.as_deref().unwrap())
                .await
                .unwrap(),
        )
        .unwrap();
        assert!(text.contains("out-0-0, out-0-1"));
        assert!(text.contains("out-1-0"));
    }

    #[tokio::test]
    async fn first_failure_fails_the_task_but_slots_still_land() {
        let (fx, job_id, tasks) = fixture(&[3], None).await;

        fx.aggregator
            .handle_report(UnitReport::success(job_id, tasks[0], 0, "out-a".into()))
            .await
            .unwrap();
        fx.aggregator
            .handle_report(UnitReport::failure(job_id, tasks[0], 1, "404".into()))
            .await
            .unwrap();

        let task = fx.store.get_task(tasks[0]).await.unwrap().unwrap();
        assert_eq!(task.status, TaskState::Failed);

        // The failure was the task's terminal transition; the job is done.
        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobState::Completed);
        assert_eq!(job.processed_items, 1);

        // Output carries the slot that did succeed and blanks the rest.
        let text = String::from_utf8(
            fx.artifacts
                .get(job.output_ref.as_deref().unwrap())
                .await
                .unwrap(),
        )
        .unwrap();
        assert!(text.contains("out-a, , "));
    }

    #[tokio::test]
    async fn completion_fires_exactly_once_under_concurrent_terminal_reports() {
        let n = 16;
        let slots: Vec<usize> = vec![1; n];
        let (fx, job_id, tasks) = fixture(&slots, Some("https://example.com/hook")).await;

        let mut handles = Vec::new();
        for (i, task_id) in tasks.into_iter().enumerate() {
            let aggregator = fx.aggregator.clone();
            handles.push(tokio::spawn(async move {
                aggregator
                    .handle_report(UnitReport::success(job_id, task_id, 0, format!("out-{i}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobState::Completed);
        assert_eq!(job.processed_items, n as u32);

        // Exactly one assembly (one artifact write) and one callback.
        assert_eq!(fx.artifacts.puts.load(Ordering::SeqCst), 1);
        assert_eq!(fx.sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reports_after_the_job_is_terminal_are_dropped() {
        let (fx, job_id, tasks) = fixture(&[1], None).await;

        fx.aggregator
            .handle_report(UnitReport::success(job_id, tasks[0], 0, "out-a".into()))
            .await
            .unwrap();
        let completed = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(completed.status, JobState::Completed);
        let first_output = completed.output_ref.clone();

        // Redelivered report: no second assembly, no state change.
        fx.aggregator
            .handle_report(UnitReport::success(job_id, tasks[0], 0, "out-b".into()))
            .await
            .unwrap();

        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.output_ref, first_output);
        assert_eq!(fx.artifacts.puts.load(Ordering::SeqCst), 1);

        let task = fx.store.get_task(tasks[0]).await.unwrap().unwrap();
        assert_eq!(task.derived_refs[0].as_deref(), Some("out-a"));
    }

    #[tokio::test]
    async fn duplicate_report_before_completion_does_not_double_count() {
        let (fx, job_id, tasks) = fixture(&[1, 1], None).await;

        let report = UnitReport::success(job_id, tasks[0], 0, "out-a".into());
        fx.aggregator.handle_report(report.clone()).await.unwrap();
        fx.aggregator.handle_report(report).await.unwrap();

        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.processed_items, 1);
        assert_eq!(job.status, JobState::Processing);
    }

    #[tokio::test]
    async fn all_failed_tasks_still_complete_the_job() {
        let (fx, job_id, tasks) = fixture(&[1, 1], None).await;

        for task_id in &tasks {
            fx.aggregator
                .handle_report(UnitReport::failure(job_id, *task_id, 0, "down".into()))
                .await
                .unwrap();
        }

        let job = fx.store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobState::Completed);
        assert_eq!(job.processed_items, 2);
        assert!(job.output_ref.is_some());
    }

    #[tokio::test]
    async fn unknown_job_is_an_error() {
        let (fx, _job_id, _tasks) = fixture(&[1], None).await;
        let stray = UnitReport::success(
            JobId::from_ulid(Ulid::new()),
            TaskId::from_ulid(Ulid::new()),
            0,
            "out".into(),
        );
        let err = fx.aggregator.handle_report(stray).await.unwrap_err();
        assert!(matches!(err, PipelineError::JobNotFound(_)));
    }
}
