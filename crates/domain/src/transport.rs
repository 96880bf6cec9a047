//! Transport port: the only way the client reaches the network.
//!
//! The resolver builds [`Request`]s and hands them to a [`Transport`]; an
//! infrastructure adapter turns them into real HTTP calls. Adapters own base
//! URL joining, authentication, timeouts and status mapping. The core never
//! retries and never translates a [`TransportError`].
//!
//! ## Architectural Layer
//!
//! Port. Defined here so that `domain` and `resources` stay free of I/O
//! crates; implemented by the `transport` crate and by in-memory test doubles.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

use crate::errors::TransportError;

/// HTTP verbs the Connect API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to the Connect server.
///
/// `path` is relative to the server base URL (e.g. `v1/vaults/`).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Wire-shaped JSON body.
    pub body: Option<Value>,
    /// Extra headers on top of the adapter's defaults.
    pub headers: Vec<(String, String)>,
    /// Overrides the adapter's default timeout.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parses the body as JSON. An empty body reads as `null`.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the body is not JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }
}

/// Chunks of a streamed response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Sends requests to the Connect server.
///
/// Implementations return `Ok` only for 2xx responses; anything else is a
/// [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and buffers the whole response body.
    async fn send(&self, request: Request) -> Result<Response, TransportError>;

    /// Sends `request` and yields the response body as it arrives.
    async fn send_streaming(&self, request: Request) -> Result<ByteStream, TransportError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
