//! Application logic: dispatch, unit execution, aggregation, assembly,
//! notification, status views, and tabular I/O.

pub mod aggregator;
pub mod assembler;
pub mod config;
pub mod dispatch;
pub mod notifier;
pub mod retry;
pub mod status;
pub mod tabular;
mod worker;

pub use self::aggregator::Aggregator;
pub use self::assembler::OutputAssembler;
pub use self::config::PipelineConfig;
pub use self::dispatch::Dispatcher;
pub use self::notifier::Notifier;
pub use self::retry::ReportRetryPolicy;
pub use self::status::{job_results, job_status, JobResultsView, TaskResultView};
