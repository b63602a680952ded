//! HTTP transport port
//!
//! The session client never talks to the network directly. It builds
//! [`HttpRequest`] values and hands them to an [`HttpTransport`]; the adapter
//! in the infrastructure layer owns connection pooling, cookies, proxies and
//! TLS.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a transport adapter.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Outbound request description.
///
/// `form` is sent as an `application/x-www-form-urlencoded` body when
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and decoded body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A single HTTP session (cookie jar + connection pool).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one request. Non-2xx statuses are returned, not raised.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Release the underlying connection. A later `execute` may reopen it.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds transports for session clients.
///
/// `client_id` identifies the slot (or batch index) the transport is for;
/// adapters may use it to pick a proxy session.
pub trait TransportFactory: Send + Sync {
    fn create(&self, client_id: Option<usize>) -> Result<Arc<dyn HttpTransport>, TransportError>;
}
