//! Tabular I/O boundary: batch files in, output tables out.
//!
//! Input uses the legacy column names ("S. No.", "Product Name", "Input Image
//! Urls"); the output adds an "Output Image Urls" column. Row validation
//! itself lives in `domain::row` - this module only moves bytes to and from
//! `RawRow`/`TaskRecord`.

use std::io::Read;

use tracing::warn;

use crate::domain::{RawRow, TaskRecord};
use crate::error::PipelineError;

const COL_SEQUENCE: &str = "S. No.";
const COL_LABEL: &str = "Product Name";
const COL_SOURCES: &str = "Input Image Urls";
const COL_DERIVED: &str = "Output Image Urls";

/// Read every data row of a batch file. Missing cells become empty strings and
/// fail row validation downstream instead of aborting the whole batch.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let sequence_at = position(COL_SEQUENCE);
    let label_at = position(COL_LABEL);
    let sources_at = position(COL_SOURCES);
    if sequence_at.is_none() || label_at.is_none() || sources_at.is_none() {
        warn!(headers = ?headers, "batch file is missing expected columns");
    }

    let cell = |record: &csv::StringRecord, at: Option<usize>| -> String {
        at.and_then(|i| record.get(i)).unwrap_or_default().to_string()
    };

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(RawRow {
            sequence: cell(&record, sequence_at),
            label: cell(&record, label_at),
            sources: cell(&record, sources_at),
        });
    }
    Ok(rows)
}

/// Render the output table for a job's tasks. The caller supplies tasks
/// already ordered by sequence number; empty derived slots render as empty
/// strings so the row shape is stable regardless of failures.
pub fn write_output(tasks: &[TaskRecord]) -> Result<Vec<u8>, PipelineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([COL_SEQUENCE, COL_LABEL, COL_SOURCES, COL_DERIVED])?;

    for task in tasks {
        let derived: Vec<&str> = task
            .derived_refs
            .iter()
            .map(|slot| slot.as_deref().unwrap_or(""))
            .collect();
        writer.write_record([
            task.sequence_number.to_string(),
            task.label.clone(),
            task.source_refs.join(", "),
            derived.join(", "),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::Other(format!("csv flush: {e}")))
}
