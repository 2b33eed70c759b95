//! Raw form input for the search and edit screens.
//!
//! Each input struct carries the text exactly as typed. `validate` converts
//! every field, even after an earlier one failed, and returns either the
//! typed value or all of the field errors together.

use crate::types::{Author, BookFilter, BookRecord, Publisher};
use crate::validation::{FieldValidator, ValidationErrors, DISPLAY_DATE_FORMAT};

pub const FIELD_ID: &str = "id";
pub const FIELD_ISBN: &str = "isbn";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_AUTHOR: &str = "author";
pub const FIELD_PUBLISHER: &str = "publisher";
pub const FIELD_PUBLICATION_DATE: &str = "publicationDate";

/// Search screen text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilterInput {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    /// `dd/MM/yyyy`
    pub publication_date: String,
}

impl BookFilterInput {
    pub fn validate(&self) -> Result<BookFilter, ValidationErrors> {
        let mut validator = FieldValidator::new();
        let filter = BookFilter {
            id: validator.to_integer(FIELD_ID, &self.id),
            isbn: validator.to_isbn(FIELD_ISBN, &self.isbn),
            title: validator.to_text(FIELD_TITLE, &self.title),
            author: validator.to_text(FIELD_AUTHOR, &self.author),
            publisher: validator.to_text(FIELD_PUBLISHER, &self.publisher),
            publication_date: validator.to_date(
                FIELD_PUBLICATION_DATE,
                &self.publication_date,
                DISPLAY_DATE_FORMAT,
            ),
        };
        validator.finish(filter)
    }
}

/// Edit screen text fields. Author and publisher hold a single name each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookRecordInput {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    /// `dd/MM/yyyy`
    pub publication_date: String,
}

impl BookRecordInput {
    pub fn validate(&self) -> Result<BookRecord, ValidationErrors> {
        let mut validator = FieldValidator::new();
        let record = BookRecord {
            id: validator.to_integer(FIELD_ID, &self.id),
            isbn: validator.to_isbn(FIELD_ISBN, &self.isbn),
            title: validator.to_text(FIELD_TITLE, &self.title).unwrap_or_default(),
            authors: validator
                .to_text(FIELD_AUTHOR, &self.author)
                .map(Author::new)
                .into_iter()
                .collect(),
            publishers: validator
                .to_text(FIELD_PUBLISHER, &self.publisher)
                .map(Publisher::new)
                .into_iter()
                .collect(),
            publication_date: validator.to_date(
                FIELD_PUBLICATION_DATE,
                &self.publication_date,
                DISPLAY_DATE_FORMAT,
            ),
        };
        validator.finish(record)
    }

    /// Pre-fills the form from a stored record, showing the first author and
    /// publisher.
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_string()).unwrap_or_default(),
            isbn: record.isbn.clone().unwrap_or_default(),
            title: record.title.clone(),
            author: record
                .authors
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            publisher: record
                .publishers
                .first()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            publication_date: record
                .publication_date
                .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}
