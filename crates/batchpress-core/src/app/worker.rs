//! Fetch-transform unit execution.
//!
//! One unit = one source locator: fetch the bytes, derive the compressed
//! artifact, store it, and report the outcome to the aggregator exactly once.
//! Nothing escapes the unit boundary; both the happy path and every failure
//! end in a `UnitReport`.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, warn};

use super::aggregator::Aggregator;
use super::retry::ReportRetryPolicy;
use crate::domain::{JobId, TaskId, UnitReport};
use crate::error::PipelineError;
use crate::ports::{ArtifactStore, ImageFetcher, ImageTransformer};

/// Shared dependencies of every unit.
pub(crate) struct UnitContext {
    pub fetcher: Arc<dyn ImageFetcher>,
    pub transformer: Arc<dyn ImageTransformer>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub aggregator: Arc<Aggregator>,
    pub retry: ReportRetryPolicy,
}

/// Run one unit to completion. The permit bounds global fan-out; it is
/// acquired here rather than in the dispatcher so `submit` never blocks.
pub(crate) async fn run_unit(
    ctx: Arc<UnitContext>,
    permits: Arc<Semaphore>,
    job_id: JobId,
    task_id: TaskId,
    index: usize,
    url: String,
) {
    let Ok(permit) = permits.acquire_owned().await else {
        // Semaphore closed means the process is going down; nothing to report.
        return;
    };
    let _permit: OwnedSemaphorePermit = permit;

    let report = match derive(&ctx, &url).await {
        Ok(derived_ref) => {
            debug!(%job_id, %task_id, index, %derived_ref, "unit succeeded");
            UnitReport::success(job_id, task_id, index, derived_ref)
        }
        Err(e) => {
            warn!(%job_id, %task_id, index, %url, error = %e, "unit failed");
            UnitReport::failure(job_id, task_id, index, e.to_string())
        }
    };

    deliver_report(&ctx, report).await;
}

async fn derive(ctx: &UnitContext, url: &str) -> Result<String, PipelineError> {
    let bytes = ctx.fetcher.fetch(url).await?;
    let derived = ctx.transformer.transform(&bytes).await?;
    ctx.artifacts.put(&derived, "jpg").await
}

/// Hand the report to the aggregator, retrying with backoff. After the last
/// attempt the loss is logged and swallowed: the job may stall short of
/// `total_items`, which is an availability gap, not a correctness one.
async fn deliver_report(ctx: &UnitContext, report: UnitReport) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match ctx.aggregator.handle_report(report.clone()).await {
            Ok(()) => return,
            Err(e) if attempts < ctx.retry.max_attempts => {
                let delay = ctx.retry.next_delay(attempts);
                warn!(
                    job_id = %report.job_id,
                    task_id = %report.task_id,
                    index = report.index,
                    error = %e,
                    attempts,
                    "report delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(
                    job_id = %report.job_id,
                    task_id = %report.task_id,
                    index = report.index,
                    error = %e,
                    attempts,
                    "report delivery dropped"
                );
                return;
            }
        }
    }
}
