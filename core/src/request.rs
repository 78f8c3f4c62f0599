//! Per-call request description and the shared request builder.
//!
//! # Design
//! `RequestConfig` is what a caller describes: method, path, optional body,
//! query parameters and extra headers. [`build_request`] turns it into a
//! wire-ready [`HttpRequest`] using the client configuration and the token
//! captured at build time. JSON calls, multipart uploads and binary
//! downloads all pass through the same builder, so header and token
//! handling cannot diverge between them.

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::config::ApiClientConfig;
use crate::error::ApiError;
use crate::http::{HttpBody, HttpMethod, HttpRequest, MultipartBody};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// Body of a request before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    Json(Value),
    Multipart(MultipartBody),
}

/// One call's request. Transient: built, consumed by the client, dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: HttpMethod,
    /// Path appended verbatim to the configured base URL.
    pub url: String,
    pub data: Option<RequestData>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: None,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Attach a JSON body.
    pub fn json<D: Serialize + ?Sized>(mut self, data: &D) -> Result<Self, ApiError> {
        let value = serde_json::to_value(data).map_err(ApiError::serialization)?;
        self.data = Some(RequestData::Json(value));
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.data = Some(RequestData::Multipart(body));
        self
    }

    /// Append query parameters from any value serializing to a JSON object.
    pub fn params<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self, ApiError> {
        self.params.extend(query_pairs(params)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Flatten a serializable value into ordered query pairs.
///
/// Null fields are skipped, arrays are joined with `,` and nested objects
/// are sent as their JSON text. Anything that is not an object (or null)
/// is rejected.
pub fn query_pairs<P: Serialize + ?Sized>(params: &P) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(params).map_err(ApiError::serialization)?;
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(ApiError::transport(format!(
                "query parameters must be an object, got {other}"
            )))
        }
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| query_value(value).map(|v| (key, v)))
        .collect())
}

fn query_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// Form-urlencode pairs in order. Empty input yields an empty string.
pub fn encode_query(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

/// Build the wire request for `request`.
///
/// Header precedence, lowest first: `Content-Type: application/json`, the
/// configured headers, the per-call headers. `Authorization` is set last
/// and only when `token` is present. Multipart requests carry no
/// `Content-Type` so the transport can set the boundary.
pub fn build_request(
    config: &ApiClientConfig,
    token: Option<&str>,
    request: RequestConfig,
) -> Result<HttpRequest, ApiError> {
    let RequestConfig {
        method,
        url: path,
        data,
        params,
        headers: call_headers,
    } = request;

    let mut url = format!("{}{}", config.base_url, path);
    let query = encode_query(&params);
    if !query.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }

    let multipart = matches!(data, Some(RequestData::Multipart(_)));
    let mut headers = Vec::new();
    if !multipart {
        headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
    }
    for (name, value) in config.headers.iter().chain(call_headers.iter()) {
        if multipart && name.eq_ignore_ascii_case(CONTENT_TYPE) {
            continue;
        }
        set_header(&mut headers, name, value);
    }
    if let Some(token) = token {
        set_header(&mut headers, AUTHORIZATION, &format!("Bearer {token}"));
    }

    let body = match data {
        Some(RequestData::Json(value)) => Some(HttpBody::Json(
            serde_json::to_string(&value).map_err(ApiError::serialization)?,
        )),
        Some(RequestData::Multipart(form)) => Some(HttpBody::Multipart(form)),
        None => None,
    };

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
    })
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(entry) => *entry = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}
