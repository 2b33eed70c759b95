//! HTTP request/response values and the pure steps around them.
//!
//! # Design
//! Requests and responses are plain data. Building a request, checking a
//! status and decoding a body never touch the network, so each step can be
//! tested on its own; only a `Transport` performs I/O. Status validation is
//! deliberately separate from decoding: callers validate, then decode.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::types::ServerError;

pub const ACCEPT: &str = "accept";
pub const CONTENT_TYPE: &str = "content-type";
pub const JSON: &str = "application/json";
pub const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A body-less request that asks for JSON back.
    pub fn open(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: vec![(ACCEPT.to_string(), JSON.to_string())],
            body: None,
        }
    }

    /// A request carrying a UTF-8 JSON body.
    pub fn open_with_body(method: HttpMethod, url: impl Into<String>, body: Vec<u8>) -> Self {
        let mut request = Self::open(method, url);
        request.set_header(CONTENT_TYPE, JSON_UTF8);
        request.body = Some(body);
        request
    }

    /// Replaces any existing value for `name` (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Accepts the response when its status is one of `acceptable`.
///
/// Otherwise the body is read as a `ServerError`; a readable one becomes a
/// `ServerRejection`, an absent or unreadable one a `TransportFailure` that
/// carries only the status code.
pub fn validate_status(response: &HttpResponse, acceptable: &[u16]) -> Result<(), ApiError> {
    if acceptable.contains(&response.status) {
        return Ok(());
    }
    if response.body.trim().is_empty() {
        return Err(ApiError::unexpected_status(response.status));
    }
    match serde_json::from_str::<ServerError>(&response.body) {
        Ok(error) => Err(ApiError::ServerRejection(error)),
        Err(_) => Err(ApiError::unexpected_status(response.status)),
    }
}

/// Decodes the response body, whatever the status.
pub fn read_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DecodeFailure(e.to_string()))
}

/// Percent-encodes `value` for a URL query component (`application/x-www-form-urlencoded`).
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
