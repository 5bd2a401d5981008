//! Task record: one row's unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, TaskId};
use super::row::RowDescriptor;
use super::state::TaskState;
use crate::error::PipelineError;

/// Task record. Owns one derived slot per source locator; slot identity by
/// index is load-bearing since units resolve out of order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub job_id: JobId,

    /// The row's declared ordinal; orders the output deterministically.
    pub sequence_number: u32,

    pub label: String,
    pub source_refs: Vec<String>,

    /// One slot per source locator, filled as units resolve.
    /// Invariant: `derived_refs.len() == source_refs.len()`, always.
    pub derived_refs: Vec<Option<String>>,

    pub status: TaskState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(task_id: TaskId, job_id: JobId, row: RowDescriptor, now: DateTime<Utc>) -> Self {
        let slots = row.source_refs.len();
        Self {
            task_id,
            job_id,
            sequence_number: row.sequence_number,
            label: row.label,
            source_refs: row.source_refs,
            derived_refs: vec![None; slots],
            status: TaskState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as processing (units launched).
    pub fn begin(&mut self, now: DateTime<Utc>) {
        if self.status != TaskState::Pending {
            return;
        }
        self.status = TaskState::Processing;
        self.updated_at = now;
    }

    /// Write a derived reference into its slot.
    ///
    /// Allowed even after the task failed: a late successful unit still
    /// contributes its slot to the output. The status itself stays frozen.
    pub fn fill_slot(
        &mut self,
        index: usize,
        derived_ref: String,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let len = self.derived_refs.len();
        let slot = self
            .derived_refs
            .get_mut(index)
            .ok_or(PipelineError::SlotOutOfRange {
                task_id: self.task_id,
                index,
                len,
            })?;
        *slot = Some(derived_ref);
        self.updated_at = now;
        Ok(())
    }

    pub fn all_slots_filled(&self) -> bool {
        self.derived_refs.iter().all(Option::is_some)
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskState::Completed;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskState::Failed;
        self.updated_at = now;
    }
}
