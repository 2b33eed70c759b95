//! Book API operations on top of the transport.
//!
//! # Design
//! Every operation is split three ways. `build_*` produces an `HttpRequest`
//! and `parse_*` consumes an `HttpResponse`; both are pure. `try_*` runs the
//! exchange through a scoped `Connection` (open, send, validate, decode,
//! disconnect) and returns a `Result`. The plain-named operation wraps
//! `try_*`, reports any failure to the `MessageSink` and returns a sentinel,
//! so a UI can call it without branching on errors.

use std::path::Path;

use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{self, encode, HttpMethod, HttpRequest, HttpResponse, CONTENT_TYPE};
use crate::sink::{LogSink, MessageSink, Severity};
use crate::transport::{Connection, Transport, UreqTransport};
use crate::types::{BookFilter, BookRecord, ImportOutcome, ServerError};

const SAVE_TITLE: &str = "Error saving book";
const DELETE_TITLE: &str = "Error removing book";
const SEARCH_TITLE: &str = "Error searching books";
const LOOKUP_TITLE: &str = "Error querying Open Library";
const IMPORT_TITLE: &str = "Error importing CSV";

/// Result of looking a book up by ISBN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsbnLookup {
    Found(BookRecord),
    /// The lookup service answered but knows no such ISBN.
    NotFound,
    /// The call failed; the failure has already been reported.
    Failed,
}

impl IsbnLookup {
    pub fn into_record(self) -> Option<BookRecord> {
        match self {
            IsbnLookup::Found(record) => Some(record),
            IsbnLookup::NotFound | IsbnLookup::Failed => None,
        }
    }
}

/// Synchronous client for the book API.
///
/// Holds only the base URL, the transport and the sink failures are
/// reported to; calls share no mutable state.
pub struct BookApiClient {
    base_url: String,
    transport: Box<dyn Transport>,
    messages: Box<dyn MessageSink>,
}

impl BookApiClient {
    /// Client over HTTP that reports failures to the log.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config.base_url(), UreqTransport::from_config(config), LogSink)
    }

    pub fn with_transport(
        base_url: &str,
        transport: impl Transport + 'static,
        messages: impl MessageSink + 'static,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport: Box::new(transport),
            messages: Box::new(messages),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- requests ----------------------------------------------------------

    pub fn build_save(&self, record: &BookRecord) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_vec(record).map_err(|e| ApiError::EncodeFailure(e.to_string()))?;
        Ok(HttpRequest::open_with_body(
            HttpMethod::Post,
            format!("{}/book", self.base_url),
            body,
        ))
    }

    pub fn build_delete(&self, id: i64) -> HttpRequest {
        HttpRequest::open(HttpMethod::Delete, format!("{}/book/{id}", self.base_url))
    }

    pub fn build_search(&self, filter: &BookFilter) -> HttpRequest {
        HttpRequest::open(HttpMethod::Get, self.search_url(filter))
    }

    /// `{base}/book` plus one query parameter per constrained field.
    pub fn search_url(&self, filter: &BookFilter) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(id) = filter.id {
            params.push(format!("id={id}"));
        }
        let text_fields = [
            ("isbn", &filter.isbn),
            ("title", &filter.title),
            ("author", &filter.author),
            ("publisher", &filter.publisher),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                params.push(format!("{name}={}", encode(value)));
            }
        }
        if let Some(date) = filter.publication_date {
            params.push(format!(
                "publicationDate={}",
                encode(&date.format("%Y-%m-%d").to_string())
            ));
        }

        let url = format!("{}/book", self.base_url);
        if params.is_empty() {
            url
        } else {
            format!("{url}?{}", params.join("&"))
        }
    }

    pub fn build_lookup_by_isbn(&self, isbn: &str) -> HttpRequest {
        HttpRequest::open(
            HttpMethod::Get,
            format!("{}/open-library?isbn={}", self.base_url, encode(isbn)),
        )
    }

    /// Single-part `multipart/form-data` upload under the field name `file`.
    pub fn build_import_csv(&self, file_name: &str, contents: &[u8]) -> HttpRequest {
        let boundary = format!("----BookClientBoundary{}", Uuid::new_v4().simple());
        let body = multipart_body(&boundary, file_name, contents);
        let mut request = HttpRequest::open_with_body(
            HttpMethod::Post,
            format!("{}/book/import", self.base_url),
            body,
        );
        request.set_header(
            CONTENT_TYPE,
            &format!("multipart/form-data; boundary={boundary}"),
        );
        request
    }

    // -- responses ---------------------------------------------------------

    pub fn parse_save(&self, response: &HttpResponse) -> Result<BookRecord, ApiError> {
        http::validate_status(response, &[200, 201])?;
        http::read_json(response)
    }

    pub fn parse_delete(&self, response: &HttpResponse) -> Result<(), ApiError> {
        http::validate_status(response, &[200, 204])
    }

    pub fn parse_search(&self, response: &HttpResponse) -> Result<Vec<BookRecord>, ApiError> {
        http::validate_status(response, &[200])?;
        http::read_json(response)
    }

    /// `Ok(None)` when the service has no such ISBN: a 404 carrying the
    /// server's error body, or a 200 whose body is empty or `null`. A 404
    /// without that body means the endpoint itself was not reached and
    /// fails like any other unexpected status.
    pub fn parse_lookup_by_isbn(
        &self,
        response: &HttpResponse,
    ) -> Result<Option<BookRecord>, ApiError> {
        if response.status == 404
            && serde_json::from_str::<ServerError>(&response.body).is_ok()
        {
            return Ok(None);
        }
        http::validate_status(response, &[200])?;
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        http::read_json(response)
    }

    pub fn parse_import_csv(&self, response: &HttpResponse) -> Result<ImportOutcome, ApiError> {
        http::validate_status(response, &[200])?;
        http::read_json(response)
    }

    // -- fallible operations -------------------------------------------------

    pub fn try_save(&self, record: &BookRecord) -> Result<BookRecord, ApiError> {
        let request = self.build_save(record)?;
        self.exchange(request, |response| self.parse_save(response))
    }

    pub fn try_delete(&self, id: i64) -> Result<(), ApiError> {
        self.exchange(self.build_delete(id), |response| self.parse_delete(response))
    }

    pub fn try_search(&self, filter: &BookFilter) -> Result<Vec<BookRecord>, ApiError> {
        self.exchange(self.build_search(filter), |response| self.parse_search(response))
    }

    pub fn try_lookup_by_isbn(&self, isbn: &str) -> Result<Option<BookRecord>, ApiError> {
        self.exchange(self.build_lookup_by_isbn(isbn), |response| {
            self.parse_lookup_by_isbn(response)
        })
    }

    pub fn try_import_csv(&self, path: &Path) -> Result<ImportOutcome, ApiError> {
        let contents = std::fs::read(path).map_err(|source| ApiError::UploadUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "import.csv".to_string());
        self.try_import_csv_bytes(&file_name, &contents)
    }

    pub fn try_import_csv_bytes(
        &self,
        file_name: &str,
        contents: &[u8],
    ) -> Result<ImportOutcome, ApiError> {
        let request = self.build_import_csv(file_name, contents);
        self.exchange(request, |response| self.parse_import_csv(response))
    }

    /// Opens a connection for `request`, hands the response to `parse` and
    /// disconnects whatever the outcome.
    fn exchange<T>(
        &self,
        request: HttpRequest,
        parse: impl FnOnce(&HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut connection = Connection::open(self.transport.as_ref(), request);
        let result = connection.response().and_then(parse);
        connection.disconnect();
        result
    }

    // -- reporting operations ------------------------------------------------

    /// Saves `record`, returning the server's copy.
    pub fn save(&self, record: &BookRecord) -> Option<BookRecord> {
        self.report(self.try_save(record), SAVE_TITLE)
    }

    /// Deletes the book with `id`. Returns `false` after reporting a failure.
    pub fn delete(&self, id: i64) -> bool {
        self.report(self.try_delete(id), DELETE_TITLE).is_some()
    }

    /// Matching books; `Some(vec![])` means nothing matched, `None` that the
    /// search failed and was reported.
    pub fn search(&self, filter: &BookFilter) -> Option<Vec<BookRecord>> {
        self.report(self.try_search(filter), SEARCH_TITLE)
    }

    /// Looks `isbn` up in Open Library. A miss is shown as a warning.
    pub fn lookup_by_isbn(&self, isbn: &str) -> IsbnLookup {
        match self.report(self.try_lookup_by_isbn(isbn), LOOKUP_TITLE) {
            Some(Some(record)) => IsbnLookup::Found(record),
            Some(None) => {
                self.messages.show_message(
                    &format!("No book found for ISBN {isbn}"),
                    "Open Library",
                    Severity::Warning,
                );
                IsbnLookup::NotFound
            }
            None => IsbnLookup::Failed,
        }
    }

    /// Uploads the CSV file at `path`.
    pub fn import_csv(&self, path: &Path) -> Option<ImportOutcome> {
        self.report(self.try_import_csv(path), IMPORT_TITLE)
    }

    pub fn import_csv_bytes(&self, file_name: &str, contents: &[u8]) -> Option<ImportOutcome> {
        self.report(self.try_import_csv_bytes(file_name, contents), IMPORT_TITLE)
    }

    fn report<T>(&self, result: Result<T, ApiError>, title: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, title, "book API call failed");
                self.messages
                    .show_message(&err.user_message(), title, Severity::Error);
                None
            }
        }
    }
}

fn multipart_body(boundary: &str, file_name: &str, contents: &[u8]) -> Vec<u8> {
    let file_name: String = file_name
        .chars()
        .map(|c| if matches!(c, '"' | '\r' | '\n') { '_' } else { c })
        .collect();
    let mut body = Vec::with_capacity(contents.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
