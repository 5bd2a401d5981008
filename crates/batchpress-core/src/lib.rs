//! batchpress-core
//!
//! Core building blocks for the batchpress pipeline: accept a tabular batch of
//! products with source image URLs, fan each row out into concurrent
//! fetch-and-compress units, aggregate unit outcomes into per-task and per-job
//! state, and assemble the output table once every task has resolved.
//!
//! Module layout:
//! - **domain**: records, states, ids, row validation, unit reports
//! - **ports**: abstraction layer (RecordStore, ImageFetcher, ImageTransformer,
//!   ArtifactStore, CallbackSink, Clock, IdGenerator)
//! - **store**: in-memory RecordStore implementation
//! - **app**: application logic (dispatch, worker, aggregator, assembler,
//!   notifier, status views, tabular I/O)

pub mod app;
pub mod domain;
pub mod error;
pub mod ports;
pub mod store;

pub use error::PipelineError;
