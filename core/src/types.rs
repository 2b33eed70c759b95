//! Domain DTOs for the book API.
//!
//! # Design
//! These types mirror the server's JSON schema but are defined independently
//! of the mock-server crate; the integration tests catch schema drift.
//! Authors and publishers are name-only here. The server's ids for them are
//! ignored on the way in and never sent on the way out.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::validation::DISPLAY_DATE_FORMAT;

/// Column headings matching [`BookRecord::table_row`].
pub const BOOK_TABLE_COLUMNS: [&str; 6] =
    ["Id", "ISBN", "Title", "Authors", "Publishers", "Publication date"];

/// A book as stored by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Assigned by the server; `None` until the record is first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
}

impl BookRecord {
    pub fn authors_display(&self) -> String {
        join_names(self.authors.iter().map(|a| a.name.as_str()))
    }

    pub fn publishers_display(&self) -> String {
        join_names(self.publishers.iter().map(|p| p.name.as_str()))
    }

    /// Cells for a result table, in [`BOOK_TABLE_COLUMNS`] order. Absent
    /// values render as empty cells.
    pub fn table_row(&self) -> Vec<String> {
        vec![
            self.id.map(|id| id.to_string()).unwrap_or_default(),
            self.isbn.clone().unwrap_or_default(),
            self.title.clone(),
            self.authors_display(),
            self.publishers_display(),
            self.publication_date
                .map(|date| date.format(DISPLAY_DATE_FORMAT).to_string())
                .unwrap_or_default(),
        ]
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default)]
    pub name: String,
}

impl Publisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Search constraints. `None` means "any value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub id: Option<i64>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
}

/// Structured error body the server sends with a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub status: u16,
    #[serde(default)]
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<NaiveDateTime>,
}

/// Result of a CSV import as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    #[serde(default, rename = "books", deserialize_with = "null_as_empty")]
    pub imported: Vec<BookRecord>,
    #[serde(default, rename = "errors", deserialize_with = "null_as_empty")]
    pub row_errors: Vec<RowError>,
}

/// One CSV line the server refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub line_number: u32,
    #[serde(default)]
    pub line_content: String,
    #[serde(default)]
    pub message: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Server timestamps arrive either as a local date-time or as RFC 3339 with
/// an offset. Anything else is dropped rather than failing the whole body.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        time.map(|t| t.format(FORMAT).to_string())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|text| {
            NaiveDateTime::parse_from_str(&text, FORMAT)
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(&text).ok().map(|t| t.naive_local()))
        }))
    }
}
