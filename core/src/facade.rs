//! Single entry point for applications.

use std::sync::Arc;

use crate::auth::AuthClient;
use crate::chat::ChatClient;
use crate::client::ApiClient;
use crate::config::ApiClientConfig;
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::users::UsersClient;

/// One core client plus the three domain clients that share it.
///
/// Construct one per application session. The token lives on the shared
/// core client: `Unauthenticated` until [`set_token`](Self::set_token),
/// back to `Unauthenticated` after [`clear_token`](Self::clear_token).
/// Separate facades never share token state.
pub struct WenshuClient<T = ReqwestTransport> {
    client: Arc<ApiClient<T>>,
    pub auth: AuthClient<T>,
    pub chat: ChatClient<T>,
    pub users: UsersClient<T>,
}

impl WenshuClient<ReqwestTransport> {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        Ok(Self::from_client(ApiClient::new(config)?))
    }

    /// Client configured from `WENSHU_API_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let config = ApiClientConfig::from_env();
        tracing::info!(base_url = %config.base_url, "creating API client");
        Self::new(config)
    }
}

impl<T: Transport> WenshuClient<T> {
    pub fn with_transport(config: ApiClientConfig, transport: T) -> Self {
        Self::from_client(ApiClient::with_transport(config, transport))
    }

    fn from_client(client: ApiClient<T>) -> Self {
        let client = Arc::new(client);
        Self {
            auth: AuthClient::new(client.clone()),
            chat: ChatClient::new(client.clone()),
            users: UsersClient::new(client.clone()),
            client,
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.client.set_token(token);
    }

    pub fn clear_token(&self) {
        self.client.clear_token();
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    /// The shared core client, for requests the domain clients don't cover.
    pub fn raw(&self) -> &ApiClient<T> {
        &self.client
    }
}
