//! Executing requests and scoping each exchange.
//!
//! # Design
//! `Transport` is the only I/O seam: it turns an `HttpRequest` into an
//! `HttpResponse`, returning every status code as data. `UreqTransport` is
//! the real implementation; tests substitute scripted ones.
//!
//! `Connection` is one exchange held as a scoped resource. The request is
//! sent lazily the first time the status or body is needed, and the
//! connection is released exactly once, either by `disconnect` or on drop,
//! so early returns through `?` cannot leak it.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{self, HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response whatever its status. Only
    /// failures below HTTP (connect, timeout, broken stream) are errors.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Called once when the connection that issued `request` is closed.
    fn release(&self, _request: &HttpRequest) {}
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }

    fn release(&self, request: &HttpRequest) {
        (**self).release(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Agent with `timeout` applied to connecting and to receiving the
    /// response and its body.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(timeout))
            .timeout_recv_response(Some(timeout))
            .timeout_recv_body(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout())
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let result = match (request.method, &request.body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), headers).send(body.as_slice())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// A single request/response exchange, released on drop.
pub struct Connection<'t> {
    transport: &'t dyn Transport,
    request: HttpRequest,
    response: Option<HttpResponse>,
    open: bool,
}

impl<'t> Connection<'t> {
    pub fn open(transport: &'t dyn Transport, request: HttpRequest) -> Self {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "connection opened");
        Self {
            transport,
            request,
            response: None,
            open: true,
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The response, sending the request first if that has not happened yet.
    pub fn response(&mut self) -> Result<&HttpResponse, ApiError> {
        if !self.open {
            return Err(ApiError::transport("connection already closed"));
        }
        let response = match self.response.take() {
            Some(response) => response,
            None => self.transport.execute(&self.request)?,
        };
        Ok(&*self.response.insert(response))
    }

    pub fn status(&mut self) -> Result<u16, ApiError> {
        Ok(self.response()?.status)
    }

    /// See [`http::validate_status`].
    pub fn validate_status(&mut self, acceptable: &[u16]) -> Result<(), ApiError> {
        http::validate_status(self.response()?, acceptable)
    }

    /// See [`http::read_json`].
    pub fn read_json<T: DeserializeOwned>(&mut self) -> Result<T, ApiError> {
        http::read_json(self.response()?)
    }

    /// Releases the connection. Calling it again does nothing.
    pub fn disconnect(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.response = None;
        self.transport.release(&self.request);
        tracing::debug!(method = self.request.method.as_str(), url = %self.request.url, "connection closed");
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
