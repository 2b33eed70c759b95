//! Error types for the book API client.
//!
//! # Design
//! `ServerRejection` gets its own variant because it is the only failure the
//! user sees verbatim: the server understood the request and said why it
//! refused. Everything below the application protocol (connect errors,
//! timeouts, a non-accepted status without a readable error body) is a
//! `TransportFailure`. A body of the wrong shape is a `DecodeFailure`. Those
//! two render the same generic message.

use std::path::PathBuf;

use crate::types::ServerError;

/// Errors returned by the `try_*` operations of `BookApiClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a structured error body.
    #[error("server rejected request with HTTP {}: {}", .0.status, .0.message)]
    ServerRejection(ServerError),

    /// No usable answer: network error, timeout, or an unexpected status
    /// without a parsable error body.
    #[error("{}", transport_text(.status, .reason))]
    TransportFailure { status: Option<u16>, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DecodeFailure(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    EncodeFailure(String),

    /// The file selected for upload could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    UploadUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn transport_text(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("HTTP error {code}"),
        None => format!("transport failure: {reason}"),
    }
}

impl ApiError {
    pub(crate) fn transport(reason: impl Into<String>) -> Self {
        ApiError::TransportFailure {
            status: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn unexpected_status(status: u16) -> Self {
        ApiError::TransportFailure {
            status: Some(status),
            reason: format!("HTTP error {status}"),
        }
    }

    /// The server's error body, when the failure is a rejection.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            ApiError::ServerRejection(error) => Some(error),
            _ => None,
        }
    }

    /// Text suitable for an error dialog.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ServerRejection(error) => format!(
                "Error: {}\nStatus: {}\nPath: {}",
                error.message, error.status, error.path
            ),
            other => format!("An unexpected error occurred: {other}"),
        }
    }
}

/// Errors raised while loading `ClientConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOOK_API_BASE_URL must not be blank")]
    EmptyBaseUrl,

    #[error("BOOK_API_TIMEOUT_MS must be a positive integer, got {value:?}")]
    InvalidTimeout { value: String },
}
