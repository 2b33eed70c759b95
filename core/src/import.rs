//! Turning a server import outcome into something a person can read.

use crate::sink::TableSink;
use crate::types::{BookRecord, ImportOutcome};

/// Column headings for [`ImportReport::error_rows`].
pub const IMPORT_ERROR_COLUMNS: [&str; 3] = ["Line", "Content", "Error"];

/// Presentation-ready view of one CSV import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Books the server created or updated, for refreshing a result table.
    pub imported: Vec<BookRecord>,
    /// One row per rejected line, in [`IMPORT_ERROR_COLUMNS`] order.
    pub error_rows: Vec<Vec<String>>,
    pub summary: String,
}

impl ImportReport {
    pub fn from_outcome(outcome: &ImportOutcome) -> Self {
        let error_rows = outcome
            .row_errors
            .iter()
            .map(|error| {
                vec![
                    error.line_number.to_string(),
                    error.line_content.clone(),
                    error.message.clone(),
                ]
            })
            .collect();
        Self {
            imported: outcome.imported.clone(),
            error_rows,
            summary: summary(outcome),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.error_rows.is_empty()
    }

    /// Hands the summary and the error table to `sink`.
    pub fn present(&self, sink: &dyn TableSink) {
        tracing::info!(
            imported = self.imported.len(),
            errors = self.error_rows.len(),
            "presenting import report"
        );
        sink.show_table(&self.summary, &IMPORT_ERROR_COLUMNS, &self.error_rows);
    }
}

fn summary(outcome: &ImportOutcome) -> String {
    let header = if outcome.row_errors.is_empty() {
        "Import finished successfully, all items were created or updated."
    } else {
        "Import finished successfully, some items were not created or updated."
    };
    format!(
        "{header}\n\nSummary:\n• Imported: {}\n• Errors: {}\n",
        outcome.imported.len(),
        outcome.row_errors.len()
    )
}
