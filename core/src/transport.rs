//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the only I/O seam in the crate. `ReqwestTransport` is the
//! production implementation; tests substitute scripted transports to drive
//! failure classification, timeouts and cancellation without sockets.
//! Deadlines are enforced by the client, not here.

use std::fmt;
use std::future::Future;

use reqwest::Client;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Message fragments that identify a low-level "could not reach the server"
/// failure, including browser-style fetch and CORS wording.
const NETWORK_FAILURE_MARKERS: &[&str] = &[
    "failed to fetch",
    "network error",
    "networkerror",
    "load failed",
    "cors",
    "cross-origin",
    "error sending request",
    "connection refused",
    "dns error",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Body,
    Other,
}

/// Failure reported by a transport before a complete response was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when the request never reached a server that answered.
    pub fn is_network_failure(&self) -> bool {
        if matches!(self.kind, TransportErrorKind::Connect | TransportErrorKind::Timeout) {
            return true;
        }
        let lower = self.message.to_ascii_lowercase();
        NETWORK_FAILURE_MARKERS.iter().any(|m| lower.contains(m))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        // The URL carries the user's query; keep it out of diagnostics.
        TransportError::new(kind, error.without_url().to_string())
    }
}

/// Performs a single HTTP round-trip.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("news-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
