//! Completion notifier: best-effort callback to the submitter's endpoint.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::JobRecord;
use crate::ports::{CallbackPayload, CallbackSink};

pub struct Notifier {
    sink: Arc<dyn CallbackSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn CallbackSink>) -> Self {
        Self { sink }
    }

    /// Deliver one notification for a terminal job. Jobs without a callback
    /// target produce no network activity at all. Delivery failure is logged
    /// and swallowed; it never affects job state and is never retried.
    pub async fn notify(&self, job: &JobRecord) {
        let Some(target) = job.callback_target.as_deref() else {
            debug!(job_id = %job.job_id, "no callback target, skipping notification");
            return;
        };

        let payload = CallbackPayload {
            job_id: job.job_id,
            status: job.status,
            output_ref: job.output_ref.clone(),
        };

        match self.sink.deliver(target, &payload).await {
            Ok(()) => debug!(job_id = %job.job_id, target, "callback delivered"),
            Err(e) => warn!(job_id = %job.job_id, target, error = %e, "callback delivery failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobId;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ulid::Ulid;

    #[derive(Default)]
    struct RecordingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CallbackSink for RecordingSink {
        async fn deliver(
            &self,
            target: &str,
            _payload: &CallbackPayload,
        ) -> Result<(), PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::Callback {
                    target: target.to_string(),
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    fn job(callback_target: Option<&str>) -> JobRecord {
        let mut job = JobRecord::new(
            JobId::from_ulid(Ulid::new()),
            callback_target.map(str::to_string),
            Utc::now(),
        );
        job.begin(1, Utc::now());
        job.record_task_done(Utc::now());
        job.mark_completed("out.csv".to_string(), Utc::now());
        job
    }

    #[tokio::test]
    async fn no_target_means_no_call() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());

        notifier.notify(&job(None)).await;
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn target_gets_exactly_one_delivery() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());

        notifier.notify(&job(Some("https://example.com/hook"))).await;
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let notifier = Notifier::new(sink.clone());

        // Must not panic or propagate.
        notifier.notify(&job(Some("https://example.com/hook"))).await;
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }
}
