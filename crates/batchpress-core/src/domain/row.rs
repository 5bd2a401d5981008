//! Input row descriptors and validation.
//!
//! The tabular boundary hands us unvalidated string fields; validation here
//! decides which rows become tasks and which are skipped (and therefore never
//! count toward a job's `total_items`).

use serde::{Deserialize, Serialize};

/// One unvalidated row as read from the batch file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    /// "S. No." column.
    pub sequence: String,
    /// "Product Name" column.
    pub label: String,
    /// "Input Image Urls" column (comma-separated).
    pub sources: String,
}

/// A validated row, ready to become a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDescriptor {
    pub sequence_number: u32,
    pub label: String,
    pub source_refs: Vec<String>,
}

impl RowDescriptor {
    /// Validate one raw row.
    ///
    /// A row is valid when the sequence number parses, the label is non-empty
    /// after trimming, and at least one non-empty source locator remains after
    /// splitting on commas and trimming. Invalid rows yield `None`; the caller
    /// decides how to report them.
    pub fn parse(raw: &RawRow) -> Option<Self> {
        let sequence_number: u32 = raw.sequence.trim().parse().ok()?;

        let label = raw.label.trim();
        if label.is_empty() {
            return None;
        }

        let source_refs: Vec<String> = raw
            .sources
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if source_refs.is_empty() {
            return None;
        }

        Some(Self {
            sequence_number,
            label: label.to_string(),
            source_refs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(sequence: &str, label: &str, sources: &str) -> RawRow {
        RawRow {
            sequence: sequence.to_string(),
            label: label.to_string(),
            sources: sources.to_string(),
        }
    }

    #[test]
    fn valid_row_is_parsed() {
        let row = RowDescriptor::parse(&raw(
            "1",
            "SKU-100",
            "https://example.com/a.jpg, https://example.com/b.jpg",
        ))
        .unwrap();

        assert_eq!(row.sequence_number, 1);
        assert_eq!(row.label, "SKU-100");
        assert_eq!(
            row.source_refs,
            vec!["https://example.com/a.jpg", "https://example.com/b.jpg"]
        );
    }

    #[test]
    fn urls_are_trimmed_and_empties_dropped() {
        let row =
            RowDescriptor::parse(&raw("2", "SKU-200", " https://example.com/a.jpg ,, ,")).unwrap();
        assert_eq!(row.source_refs, vec!["https://example.com/a.jpg"]);
    }

    #[rstest]
    #[case::missing_sequence("", "SKU-1", "https://example.com/a.jpg")]
    #[case::non_numeric_sequence("one", "SKU-1", "https://example.com/a.jpg")]
    #[case::blank_label("1", "   ", "https://example.com/a.jpg")]
    #[case::no_sources("1", "SKU-1", "")]
    #[case::only_commas("1", "SKU-1", " , , ")]
    fn invalid_rows_are_rejected(#[case] sequence: &str, #[case] label: &str, #[case] sources: &str) {
        assert!(RowDescriptor::parse(&raw(sequence, label, sources)).is_none());
    }
}
