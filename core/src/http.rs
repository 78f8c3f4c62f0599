//! HTTP request and response types described as plain data.
//!
//! # Design
//! The request builder produces `HttpRequest` values and the core client
//! parses `HttpResponse` values without touching the network. Only a
//! [`Transport`](crate::transport::Transport) executes the round-trip, which
//! keeps request construction deterministic and lets tests observe exactly
//! what would go over the wire.
//!
//! All fields use owned types so a request can be handed to a transport and
//! outlive the client call that built it.

use std::fmt;

use bytes::Bytes;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body. JSON is pre-serialized; multipart is kept structured so the
/// transport can pick the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Json(String),
    Multipart(MultipartBody),
}

/// A `multipart/form-data` body as an ordered list of fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    pub fields: Vec<MultipartField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipartField {
    pub name: String,
    pub value: MultipartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MultipartValue {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        bytes: Bytes,
    },
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(MultipartField {
            name: name.into(),
            value: MultipartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.fields.push(MultipartField {
            name: name.into(),
            value: MultipartValue::File {
                file_name: file_name.into(),
                content_type: content_type.into(),
                bytes: bytes.into(),
            },
        });
        self
    }

    /// Look up a text field by name.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| match &field.value {
            MultipartValue::Text(value) if field.name == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// An HTTP request described as plain data.
///
/// Built by the core client from a [`RequestConfig`](crate::RequestConfig)
/// and handed to a transport for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a transport, then passed to the core client for envelope
/// parsing or, for binary endpoints, returned as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
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
