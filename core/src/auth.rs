//! Authentication endpoints.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::envelope::{ApiResponse, Empty};
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    SsoLoginRequest, TokenValidation, UpdateProfileRequest, UserInfo,
};

/// Login, session and profile calls under `/auth`.
///
/// None of these touch the client's token; callers decide when to store
/// or drop it (see [`WenshuClient::set_token`](crate::WenshuClient::set_token)).
pub struct AuthClient<T = ReqwestTransport> {
    client: Arc<ApiClient<T>>,
}

impl<T: Transport> AuthClient<T> {
    pub(crate) fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<ApiResponse<LoginResponse>, ApiError> {
        self.client.post("/auth/login", request).await
    }

    pub async fn sso_login(
        &self,
        request: &SsoLoginRequest,
    ) -> Result<ApiResponse<LoginResponse>, ApiError> {
        self.client.post("/auth/sso-login", request).await
    }

    pub async fn refresh_token(
        &self,
        request: &RefreshTokenRequest,
    ) -> Result<ApiResponse<RefreshTokenResponse>, ApiError> {
        self.client.post("/auth/refresh", request).await
    }

    pub async fn logout(&self) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.post_empty("/auth/logout").await
    }

    pub async fn current_user(&self) -> Result<ApiResponse<UserInfo>, ApiError> {
        self.client.get("/auth/me").await
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.post("/auth/change-password", request).await
    }

    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<ApiResponse<UserInfo>, ApiError> {
        self.client.put("/auth/profile", request).await
    }

    pub async fn validate_token(&self) -> Result<ApiResponse<TokenValidation>, ApiError> {
        self.client.get("/auth/validate").await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ApiClientConfig;
    use crate::http::{HttpBody, HttpMethod};
    use crate::test_support::{json_response, RecordingTransport};

    fn auth(
        transport: RecordingTransport,
    ) -> (AuthClient<RecordingTransport>, Arc<ApiClient<RecordingTransport>>) {
        let config = ApiClientConfig::new("http://api.test");
        let client = Arc::new(ApiClient::with_transport(config, transport));
        (AuthClient::new(client.clone()), client)
    }

    #[tokio::test]
    async fn login_posts_credentials_and_leaves_token_alone() {
        let transport = RecordingTransport::new().respond(json_response(
            200,
            json!({"success": true, "data": {
                "accessToken": "a1", "refreshToken": "r1", "tokenType": "bearer", "expiresIn": 900,
                "user": {
                    "id": "u1", "email": "a@b.c", "role": "CLIENT", "isActive": true,
                    "createdAt": "2025-01-01T00:00:00Z"
                }
            }}),
        ));
        let (auth, client) = auth(transport);
        let request = LoginRequest {
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
        };

        let response = auth.login(&request).await.unwrap();
        assert_eq!(response.data.unwrap().access_token, "a1");
        assert!(!client.is_authenticated());

        let sent = client.transport_for_tests().last_request();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.url, "http://api.test/auth/login");
        assert_eq!(
            sent.body,
            Some(HttpBody::Json(r#"{"email":"a@b.c","password":"pw"}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn endpoints_map_to_methods_and_paths() {
        let ok = || json_response(200, json!({"success": true, "data": {"valid": true}}));
        let transport = RecordingTransport::new().respond(ok()).respond(ok()).respond(ok());
        let (auth, client) = auth(transport);

        auth.logout().await.unwrap();
        auth.validate_token().await.unwrap();
        auth.change_password(&ChangePasswordRequest {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
        })
        .await
        .unwrap();

        let sent: Vec<_> = client
            .transport_for_tests()
            .requests()
            .into_iter()
            .map(|r| (r.method, r.url, r.body.is_some()))
            .collect();
        assert_eq!(
            sent,
            vec![
                (HttpMethod::Post, "http://api.test/auth/logout".to_string(), false),
                (HttpMethod::Get, "http://api.test/auth/validate".to_string(), false),
                (HttpMethod::Post, "http://api.test/auth/change-password".to_string(), true),
            ]
        );
    }
}
