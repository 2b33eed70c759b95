//! Presentation seams for failures and tabular results.
//!
//! The client never decides how a failure reaches a human. It hands a
//! message, a title and a severity to a `MessageSink`, and import reports to
//! a `TableSink`. A desktop shell implements these with dialogs; `LogSink`
//! writes them to `tracing`.

/// How prominently a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Accepts a displayable message.
pub trait MessageSink: Send + Sync {
    fn show_message(&self, message: &str, title: &str, severity: Severity);
}

/// Accepts a message together with a table of rows.
pub trait TableSink: Send + Sync {
    fn show_table(&self, message: &str, columns: &[&str], rows: &[Vec<String>]);
}

/// Sink that emits every message and table row as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn show_message(&self, message: &str, title: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(title, "{message}"),
            Severity::Warning => tracing::warn!(title, "{message}"),
            Severity::Error => tracing::error!(title, "{message}"),
        }
    }
}

impl TableSink for LogSink {
    fn show_table(&self, message: &str, columns: &[&str], rows: &[Vec<String>]) {
        tracing::info!(rows = rows.len(), "{message}");
        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .zip(row)
                .map(|(column, cell)| format!("{column}={cell}"))
                .collect();
            tracing::info!("{}", cells.join(" "));
        }
    }
}
