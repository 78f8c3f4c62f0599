//! Typed async client for the wenshu natural-language data-query API.
//!
//! # Overview
//! [`WenshuClient`] is the entry point: it owns one [`ApiClient`] and exposes
//! the `auth`, `chat` and `users` domain clients. Every JSON call resolves to
//! an [`ApiResponse`] with `success == true`, or fails with a normalized
//! [`ApiError`].
//!
//! # Design
//! - Requests are built as plain data ([`HttpRequest`]) and executed by a
//!   [`Transport`]; `ReqwestTransport` is the default, tests substitute
//!   their own.
//! - The bearer token is per client instance and read once per request.
//! - No retries, caching or token refresh happen here. Callers own those
//!   policies.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;
pub mod users;

#[cfg(test)]
mod test_support;

pub use auth::AuthClient;
pub use chat::ChatClient;
pub use client::ApiClient;
pub use config::{ApiClientConfig, Credentials};
pub use envelope::{ApiResponse, Empty};
pub use error::{ApiError, ErrorKind};
pub use facade::WenshuClient;
pub use http::{
    HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartBody, MultipartField, MultipartValue,
};
pub use request::{RequestConfig, RequestData};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use users::UsersClient;
