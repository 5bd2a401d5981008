//! Domain model (ids, states, records, rows, unit reports).

pub mod ids;
pub mod job;
pub mod report;
pub mod row;
pub mod state;
pub mod task;

pub use ids::{JobId, TaskId};
pub use job::{JobRecord, JobStatusView};
pub use report::{UnitOutcome, UnitReport};
pub use row::{RawRow, RowDescriptor};
pub use state::{JobState, TaskState};
pub use task::TaskRecord;
