//! User administration endpoints.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::envelope::{ApiResponse, Empty};
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    BatchUserOperationRequest, CreateUserRequest, InviteUserRequest, TemporaryPassword,
    UpdateUserRequest, UserDetail, UserListResponse, UserQueryParams, UserRole, UserStats,
};

/// User management calls under `/users`.
pub struct UsersClient<T = ReqwestTransport> {
    client: Arc<ApiClient<T>>,
}

impl<T: Transport> UsersClient<T> {
    pub(crate) fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        params: &UserQueryParams,
    ) -> Result<ApiResponse<UserListResponse>, ApiError> {
        self.client.get_with_params("/users", params).await
    }

    pub async fn get(&self, user_id: &str) -> Result<ApiResponse<UserDetail>, ApiError> {
        self.client.get(&format!("/users/{user_id}")).await
    }

    pub async fn create(
        &self,
        request: &CreateUserRequest,
    ) -> Result<ApiResponse<UserDetail>, ApiError> {
        self.client.post("/users", request).await
    }

    pub async fn update(
        &self,
        user_id: &str,
        request: &UpdateUserRequest,
    ) -> Result<ApiResponse<UserDetail>, ApiError> {
        self.client.put(&format!("/users/{user_id}"), request).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.delete(&format!("/users/{user_id}")).await
    }

    pub async fn activate(&self, user_id: &str) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.post_empty(&format!("/users/{user_id}/activate")).await
    }

    pub async fn deactivate(&self, user_id: &str) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.post_empty(&format!("/users/{user_id}/deactivate")).await
    }

    pub async fn batch(
        &self,
        request: &BatchUserOperationRequest,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.post("/users/batch", request).await
    }

    pub async fn stats(&self) -> Result<ApiResponse<UserStats>, ApiError> {
        self.client.get("/users/stats").await
    }

    pub async fn reset_password(
        &self,
        user_id: &str,
    ) -> Result<ApiResponse<TemporaryPassword>, ApiError> {
        self.client.post_empty(&format!("/users/{user_id}/reset-password")).await
    }

    pub async fn invite(
        &self,
        email: &str,
        role: UserRole,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        let request = InviteUserRequest {
            email: email.to_string(),
            role,
        };
        self.client.post("/users/invite", &request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ApiClientConfig;
    use crate::http::{HttpBody, HttpMethod};
    use crate::test_support::{json_response, RecordingTransport};

    fn users(
        transport: RecordingTransport,
    ) -> (UsersClient<RecordingTransport>, Arc<ApiClient<RecordingTransport>>) {
        let config = ApiClientConfig::new("http://api.test");
        let client = Arc::new(ApiClient::with_transport(config, transport));
        (UsersClient::new(client.clone()), client)
    }

    #[tokio::test]
    async fn list_without_filters_has_no_query_string() {
        let transport = RecordingTransport::new().respond(json_response(
            200,
            json!({"success": true, "data": {
                "users": [], "total": 0, "page": 1, "limit": 20, "totalPages": 0
            }}),
        ));
        let (users, client) = users(transport);

        let list = users.list(&UserQueryParams::default()).await.unwrap();
        assert_eq!(list.data.unwrap().limit, 20);
        assert_eq!(client.transport_for_tests().last_request().url, "http://api.test/users");
    }

    #[tokio::test]
    async fn status_toggles_and_admin_actions() {
        let ok = || json_response(200, json!({"success": true}));
        let reset = json!({"success": true, "data": {"temporaryPassword": "Tmp-1234"}});
        let transport = RecordingTransport::new()
            .respond(ok())
            .respond(ok())
            .respond(json_response(200, reset))
            .respond(ok());
        let (users, client) = users(transport);

        users.activate("u1").await.unwrap();
        users.deactivate("u1").await.unwrap();
        let reset = users.reset_password("u1").await.unwrap();
        assert_eq!(reset.data.unwrap().temporary_password, "Tmp-1234");
        users.invite("new@wenshu.local", UserRole::Client).await.unwrap();

        let sent = client.transport_for_tests().requests();
        let routes: Vec<_> = sent.iter().map(|r| (r.method, r.url.as_str())).collect();
        assert_eq!(
            routes,
            vec![
                (HttpMethod::Post, "http://api.test/users/u1/activate"),
                (HttpMethod::Post, "http://api.test/users/u1/deactivate"),
                (HttpMethod::Post, "http://api.test/users/u1/reset-password"),
                (HttpMethod::Post, "http://api.test/users/invite"),
            ]
        );
        assert!(sent[0].body.is_none());
        assert_eq!(
            sent[3].body,
            Some(HttpBody::Json(r#"{"email":"new@wenshu.local","role":"CLIENT"}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let transport = RecordingTransport::new()
            .respond(json_response(404, json!({"success": false, "message": "user u9 not found"})));
        let (users, _) = users(transport);

        let err = users.get("u9").await.unwrap_err();
        assert_eq!(err.code(), 404);
        assert_eq!(err.message(), "user u9 not found");
    }
}
