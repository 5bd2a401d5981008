//! Job record and status views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::state::JobState;

/// Job record: one submitted batch, tracked across its tasks.
///
/// Design:
/// - Single source of truth for job-level progress.
/// - State transitions via methods, never direct field writes; terminal states
///   are frozen so status can only move forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobState,

    /// Number of valid rows (tasks). Set once, before any unit reports.
    pub total_items: u32,

    /// Tasks that reached a terminal status. Monotonically increasing.
    pub processed_items: u32,

    /// Reference to the assembled output artifact; set on completion only.
    pub output_ref: Option<String>,

    /// Externally supplied notification endpoint. Immutable once set.
    pub callback_target: Option<String>,

    /// Original upload file name, if known.
    pub source_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(job_id: JobId, callback_target: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: JobState::Pending,
            total_items: 0,
            processed_items: 0,
            output_ref: None,
            callback_target,
            source_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Fix the task count and move to Processing. Called once, after row
    /// validation and before any unit is launched.
    pub fn begin(&mut self, total_items: u32, now: DateTime<Utc>) {
        if self.status != JobState::Pending {
            return;
        }
        self.total_items = total_items;
        self.status = JobState::Processing;
        self.updated_at = now;
    }

    /// Record one task reaching a terminal status. Saturates at `total_items`.
    pub fn record_task_done(&mut self, now: DateTime<Utc>) -> u32 {
        if self.processed_items < self.total_items {
            self.processed_items += 1;
        }
        self.updated_at = now;
        self.processed_items
    }

    /// All tasks have resolved (success or failure).
    pub fn all_tasks_done(&self) -> bool {
        self.total_items > 0 && self.processed_items >= self.total_items
    }

    pub fn mark_completed(&mut self, output_ref: String, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobState::Completed;
        self.output_ref = Some(output_ref);
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobState::Failed;
        self.updated_at = now;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Progress percentage, rounded. 0 when no tasks were counted.
    pub fn progress_percent(&self) -> u32 {
        if self.total_items == 0 {
            return 0;
        }
        ((self.processed_items as f64 / self.total_items as f64) * 100.0).round() as u32
    }
}

/// Caller-visible status shape (what an HTTP layer would expose).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: JobId,
    pub status: JobState,
    pub progress: u32,
    pub total_items: u32,
    pub processed_items: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub output_ref: Option<String>,
}

impl From<&JobRecord> for JobStatusView {
    fn from(job: &JobRecord) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            progress: job.progress_percent(),
            total_items: job.total_items,
            processed_items: job.processed_items,
            created_at: job.created_at,
            updated_at: job.updated_at,
            output_ref: job.output_ref.clone(),
        }
    }
}
