//! Network execution of plain-data requests.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. The core client builds an
//! [`HttpRequest`], hands it over, and interprets the returned
//! [`HttpResponse`] itself; a transport never looks at status codes or
//! bodies. `ReqwestTransport` is the production implementation. Tests swap
//! in recording transports.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{ApiClientConfig, Credentials};
use crate::http::{HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartBody, MultipartValue};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub(crate) fn source_kind(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Http(e) if e.is_timeout() => "timeout",
            TransportError::Http(e) if e.is_connect() => "connect",
            TransportError::Http(e) if e.is_decode() || e.is_body() => "body",
            TransportError::Http(_) => "http",
            TransportError::Other(_) => "other",
        }
    }
}

/// Executes one HTTP round-trip.
///
/// Implementations must return every received response, whatever its
/// status; only failures to obtain a response are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
///
/// Timeout and credentials mode come from the client configuration and are
/// fixed for the transport's lifetime.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(config: &ApiClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.credentials() == Credentials::Include {
            builder = builder.cookie_store(true);
        }

        Ok(Self {
            client: builder.build()?,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(HttpBody::Json(body)) => builder.body(body),
            Some(HttpBody::Multipart(form)) => builder.multipart(into_form(form)?),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| self.classify(e))?;
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
        let body: Bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl ReqwestTransport {
    fn classify(&self, err: reqwest::Error) -> TransportError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => TransportError::Timeout(timeout),
            _ => TransportError::Http(err),
        }
    }
}

fn into_form(body: MultipartBody) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for field in body.fields {
        form = match field.value {
            MultipartValue::Text(value) => form.text(field.name, value),
            MultipartValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(&content_type)?;
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}
