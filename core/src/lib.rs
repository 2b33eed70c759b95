//! Synchronous client core for the book catalogue API.
//!
//! # Overview
//! Turns raw form text into typed filters and records, sends them to the
//! book API over HTTP and classifies every outcome, then shapes CSV import
//! results into a report a person can read.
//!
//! # Design
//! - `FieldValidator` accumulates field errors instead of stopping at the
//!   first; `isbn` holds the checksum rules it relies on.
//! - Requests and responses are plain data (`http`); only a `Transport`
//!   does I/O, and each exchange is a scoped `Connection` released on every
//!   path.
//! - `BookApiClient` exposes each operation as pure `build_*`/`parse_*`
//!   steps, a fallible `try_*` form, and a reporting form that hands
//!   failures to a `MessageSink` and never returns an error.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod import;
pub mod isbn;
pub mod sink;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::{BookApiClient, IsbnLookup};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use form::{BookFilterInput, BookRecordInput};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use import::ImportReport;
pub use sink::{LogSink, MessageSink, Severity, TableSink};
pub use transport::{Connection, Transport, UreqTransport};
pub use types::{Author, BookFilter, BookRecord, ImportOutcome, Publisher, RowError, ServerError};
pub use validation::{FieldError, FieldValidator, ValidationErrors};
