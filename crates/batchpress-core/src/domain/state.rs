//! Job and task state machines.

use serde::{Deserialize, Serialize};

/// Job state.
///
/// Transitions only move forward:
/// - Pending -> Processing -> Completed
/// - Pending -> Processing -> Failed
/// - Pending -> Failed (zero valid rows in the batch)
///
/// Completed and Failed are terminal; record methods refuse to leave them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Task state.
///
/// Transitions:
/// - Pending -> Processing -> Completed (every derived slot filled)
/// - Pending -> Processing -> Failed (first unit failure fails the task)
///
/// A Failed task's remaining successful units still fill their slots; only the
/// status itself is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pending(JobState::Pending, false)]
    #[case::processing(JobState::Processing, false)]
    #[case::completed(JobState::Completed, true)]
    #[case::failed(JobState::Failed, true)]
    fn job_terminal_states(#[case] state: JobState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[rstest]
    #[case::pending(TaskState::Pending, false)]
    #[case::processing(TaskState::Processing, false)]
    #[case::completed(TaskState::Completed, true)]
    #[case::failed(TaskState::Failed, true)]
    fn task_terminal_states(#[case] state: TaskState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn states_serialize_snake_case() {
        let s = serde_json::to_string(&JobState::Processing).unwrap();
        assert_eq!(s, "\"processing\"");
        let s = serde_json::to_string(&TaskState::Failed).unwrap();
        assert_eq!(s, "\"failed\"");
    }
}
