//! Error type for the news client.
//!
//! # Design
//! Every failure the client can produce collapses into one `ClientError`
//! carrying a user-safe `message` plus optional diagnostics. `code` labels
//! failures detected before or around I/O; upstream error responses are left
//! unlabeled and are described by `status` and the raw `details` payload.
//! No constructor ever formats the API key into the message.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Mode;
use crate::types::LogicalEndpoint;

/// Coarse failure class attached to errors raised by the client itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport failure: unreachable host, CORS-style block, timeout, cancellation.
    Network,
    /// Missing or unusable configuration, detected before any request.
    Config,
    /// Caller input rejected before any request.
    Validation,
}

/// Why an in-flight request was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The per-request deadline elapsed.
    Timeout,
    /// The caller's cancellation token fired.
    Caller,
}

/// The single error shape surfaced by every fetch operation.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ClientError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip)]
    pub cancelled: Option<CancelReason>,
}

impl ClientError {
    fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
            status: None,
            details: None,
            cancelled: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::Validation, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::Config, message)
    }

    /// Browser-style network failure (unreachable host, blocked cross-origin
    /// request). Names the mode and endpoint only.
    pub fn network(mode: Mode, endpoint: LogicalEndpoint) -> Self {
        let hint = match mode {
            Mode::Proxy => "check that the proxy is running and its base URL is correct",
            Mode::Direct => {
                "check your network connection and whether the news API allows requests from this origin (CORS)"
            }
        };
        Self::coded(
            ErrorCode::Network,
            format!(
                "Network request to '{}' failed in {} mode: {hint}.",
                endpoint.as_str(),
                mode.as_str()
            ),
        )
    }

    /// Transport failure that does not look like a connectivity problem.
    pub fn transport(mode: Mode, endpoint: LogicalEndpoint) -> Self {
        Self::coded(
            ErrorCode::Network,
            format!(
                "Request to '{}' could not be completed in {} mode.",
                endpoint.as_str(),
                mode.as_str()
            ),
        )
    }

    pub fn cancelled(reason: CancelReason, timeout: Duration) -> Self {
        let message = match reason {
            CancelReason::Timeout => {
                format!("The request timed out after {}. Please try again.", describe(timeout))
            }
            CancelReason::Caller => "The request was cancelled.".to_string(),
        };
        Self {
            cancelled: Some(reason),
            ..Self::coded(ErrorCode::Network, message)
        }
    }

    /// Upstream answered with a non-success status or an explicit error payload.
    pub fn upstream(status: u16, details: Option<Value>, api_key: Option<&str>) -> Self {
        let message = match status {
            429 => "Rate limit reached. Please wait a moment before trying again.".to_string(),
            s if s >= 500 => "The news service is unavailable. Please try again later.".to_string(),
            401 | 403 => "Unauthorized: check your API key or proxy authorization.".to_string(),
            _ => details
                .as_ref()
                .and_then(embedded_message)
                .map(|m| scrub(m, api_key))
                .unwrap_or_else(|| format!("Request failed with status {status}.")),
        };
        Self {
            message,
            code: None,
            status: Some(status),
            details,
            cancelled: None,
        }
    }

    /// True when the caller's token, not the deadline, ended the request.
    pub fn is_caller_cancelled(&self) -> bool {
        self.cancelled == Some(CancelReason::Caller)
    }

    pub fn is_timeout(&self) -> bool {
        self.cancelled == Some(CancelReason::Timeout)
    }
}

/// Whole seconds when exact, milliseconds otherwise.
fn describe(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 && !timeout.is_zero() {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{} ms", timeout.as_millis())
    }
}

/// `message`, then `error`, from an upstream error payload.
fn embedded_message(payload: &Value) -> Option<&str> {
    ["message", "error"]
        .iter()
        .filter_map(|field| payload.get(field).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Remove every occurrence of `api_key` from text that came from upstream.
pub fn scrub(message: &str, api_key: Option<&str>) -> String {
    match api_key {
        Some(key) if !key.is_empty() => message.replace(key, "[REDACTED]"),
        _ => message.to_string(),
    }
}
