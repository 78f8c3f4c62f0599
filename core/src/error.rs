//! Error types for the wenshu API client.
//!
//! # Design
//! Every failure a caller can observe is a single `ApiError` shape:
//! a numeric `code`, a human-readable `message` and optional `details`.
//! `code == 0` marks a transport failure (network, timeout, unparseable
//! body); any other value is the HTTP status the server answered with.
//! Values are only created by the core client's translation path, so the
//! constructors are crate-private.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::transport::TransportError;

/// Coarse classification derived from [`ApiError::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network unreachable, timeout, or a body that could not be parsed.
    Transport,
    /// The server answered with a non-2xx status or a failure envelope.
    Http,
}

/// Normalized error returned by every client call.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Map<String, Value>>,
}

impl ApiError {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    pub fn kind(&self) -> ErrorKind {
        if self.code == 0 {
            ErrorKind::Transport
        } else {
            ErrorKind::Http
        }
    }

    /// HTTP status for errors of kind [`ErrorKind::Http`].
    pub fn status(&self) -> Option<u16> {
        match self.kind() {
            ErrorKind::Http => Some(self.code),
            ErrorKind::Transport => None,
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            details: None,
        }
    }

    pub(crate) fn from_transport(err: TransportError) -> Self {
        let mut details = Map::new();
        details.insert("source".to_string(), Value::from(err.source_kind()));
        Self {
            code: 0,
            message: err.to_string(),
            details: Some(details),
        }
    }

    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        Self::transport(format!("failed to serialize request: {err}"))
    }

    pub(crate) fn parse(err: serde_json::Error) -> Self {
        Self::transport(format!("failed to parse response: {err}"))
    }

    /// Non-2xx response. The message comes from the body's `message` field
    /// when it is a non-empty string, otherwise `HTTP <status>`.
    pub(crate) fn http(status: u16, body: Option<&Value>) -> Self {
        let message = body
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP {status}"));
        Self {
            code: status,
            message,
            details: Some(status_details(status, body)),
        }
    }

    /// 2xx response carrying `success: false`.
    pub(crate) fn rejected(status: u16, body: &Value) -> Self {
        let text_field = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_owned)
        };
        let message = text_field("message")
            .or_else(|| text_field("error"))
            .unwrap_or_else(|| format!("HTTP {status}"));
        let mut details = status_details(status, Some(body));
        if let Some(code) = body.get("code").filter(|c| !c.is_null()) {
            details.insert("code".to_string(), code.clone());
        }
        Self {
            code: status,
            message,
            details: Some(details),
        }
    }
}

fn status_details(status: u16, body: Option<&Value>) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("status".to_string(), Value::from(status));
    if let Some(error) = body.and_then(|b| b.get("error")).filter(|e| !e.is_null()) {
        details.insert("error".to_string(), error.clone());
    }
    details
}
