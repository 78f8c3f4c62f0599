//! Core HTTP client for the wenshu API.
//!
//! # Design
//! `ApiClient` owns the immutable configuration, one transport and the
//! optional bearer token. Each call goes through three steps:
//! build (`RequestConfig` + token snapshot → `HttpRequest`), execute (the
//! transport), translate (`HttpResponse` → `ApiResponse<T>` or `ApiError`).
//! The token is read once while building, so a `set_token`/`clear_token`
//! racing with an in-flight call never changes what that call sends.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiClientConfig;
use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartBody};
use crate::request::{build_request, RequestConfig};
use crate::transport::{ReqwestTransport, Transport};

pub struct ApiClient<T = ReqwestTransport> {
    config: ApiClientConfig,
    transport: T,
    token: ArcSwapOption<String>,
}

impl ApiClient<ReqwestTransport> {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config).map_err(ApiError::from_transport)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ApiClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            token: ArcSwapOption::empty(),
        }
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn transport_for_tests(&self) -> &T {
        &self.transport
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.token.store(Some(Arc::new(token.into())));
    }

    /// Drop the token. Calling it with no token set is a no-op.
    pub fn clear_token(&self) {
        self.token.store(None);
    }

    pub fn token(&self) -> Option<String> {
        self.token.load_full().map(|token| token.as_ref().clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    /// Build the wire request for `request` using the current token.
    pub fn build(&self, request: RequestConfig) -> Result<HttpRequest, ApiError> {
        let token = self.token.load_full();
        build_request(&self.config, token.as_deref().map(String::as_str), request)
    }

    async fn send(&self, request: RequestConfig) -> Result<HttpResponse, ApiError> {
        let request = self.build(request)?;
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let response = self.transport.execute(request).await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "transport failure");
            ApiError::from_transport(e)
        })?;

        tracing::debug!(%method, %url, status = response.status, "received response");
        Ok(response)
    }

    /// Send a request and unwrap the JSON envelope.
    pub async fn request<R: DeserializeOwned>(
        &self,
        request: RequestConfig,
    ) -> Result<ApiResponse<R>, ApiError> {
        let response = self.send(request).await?;
        parse_envelope(&response).inspect_err(|e| {
            tracing::debug!(code = e.code(), error = %e, "request failed");
        })
    }

    pub async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<ApiResponse<R>, ApiError> {
        self.request(RequestConfig::new(HttpMethod::Get, url)).await
    }

    /// GET with query parameters taken from `params` (see [`crate::request::query_pairs`]).
    pub async fn get_with_params<R, P>(
        &self,
        url: &str,
        params: &P,
    ) -> Result<ApiResponse<R>, ApiError>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.request(RequestConfig::new(HttpMethod::Get, url).params(params)?)
            .await
    }

    pub async fn post<R, D>(&self, url: &str, data: &D) -> Result<ApiResponse<R>, ApiError>
    where
        R: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        self.request(RequestConfig::new(HttpMethod::Post, url).json(data)?)
            .await
    }

    /// POST without a body.
    pub async fn post_empty<R: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<ApiResponse<R>, ApiError> {
        self.request(RequestConfig::new(HttpMethod::Post, url)).await
    }

    pub async fn put<R, D>(&self, url: &str, data: &D) -> Result<ApiResponse<R>, ApiError>
    where
        R: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        self.request(RequestConfig::new(HttpMethod::Put, url).json(data)?)
            .await
    }

    pub async fn delete<R: DeserializeOwned>(&self, url: &str) -> Result<ApiResponse<R>, ApiError> {
        self.request(RequestConfig::new(HttpMethod::Delete, url)).await
    }

    /// POST a multipart form. The response is still a JSON envelope.
    pub async fn upload<R: DeserializeOwned>(
        &self,
        url: &str,
        form: MultipartBody,
    ) -> Result<ApiResponse<R>, ApiError> {
        self.request(RequestConfig::new(HttpMethod::Post, url).multipart(form))
            .await
    }

    /// POST a JSON body and return the raw response bytes.
    ///
    /// Non-2xx responses are translated exactly like envelope calls.
    pub async fn download<D: Serialize + ?Sized>(
        &self,
        url: &str,
        data: &D,
    ) -> Result<Bytes, ApiError> {
        let response = self
            .send(RequestConfig::new(HttpMethod::Post, url).json(data)?)
            .await?;
        if !response.is_success() {
            let body = serde_json::from_slice::<Value>(&response.body).ok();
            return Err(ApiError::http(response.status, body.as_ref()));
        }
        Ok(response.body)
    }
}

/// Translate a response into a success envelope or an `ApiError`.
fn parse_envelope<R: DeserializeOwned>(
    response: &HttpResponse,
) -> Result<ApiResponse<R>, ApiError> {
    let body = serde_json::from_slice::<Value>(&response.body);

    if !response.is_success() {
        return Err(ApiError::http(response.status, body.as_ref().ok()));
    }

    let body = body.map_err(ApiError::parse)?;
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::rejected(response.status, &body));
    }

    let mut envelope: ApiResponse<R> = serde_json::from_value(body).map_err(ApiError::parse)?;
    if envelope.data.is_none() {
        // Unit-like payloads deserialize from null; anything else is missing.
        let data = R::deserialize(Value::Null)
            .map_err(|_| ApiError::transport("response envelope is missing data"))?;
        envelope.data = Some(data);
    }
    Ok(envelope)
}
