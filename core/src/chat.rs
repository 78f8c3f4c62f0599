//! Natural-language query endpoints.

use std::sync::Arc;

use bytes::Bytes;

use crate::client::ApiClient;
use crate::envelope::{ApiResponse, Empty};
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::chat::SessionTitle;
use crate::types::{
    ChartDownloadRequest, ChatHistoryRequest, ChatHistoryResponse, ChatQueryRequest,
    ChatQueryResponse, FeedbackRequest, FileUploadRequest, FileUploadResponse, SessionCreated,
};

/// Query, history, feedback, file and session calls under `/chat`.
///
/// `upload_file` sends multipart and `download_chart` returns raw bytes;
/// both still go through the core client's request builder, so token and
/// header handling is the same as for every other call.
pub struct ChatClient<T = ReqwestTransport> {
    client: Arc<ApiClient<T>>,
}

impl<T: Transport> ChatClient<T> {
    pub(crate) fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    pub async fn query(
        &self,
        request: &ChatQueryRequest,
    ) -> Result<ApiResponse<ChatQueryResponse>, ApiError> {
        self.client.post("/chat/query", request).await
    }

    pub async fn history(
        &self,
        request: &ChatHistoryRequest,
    ) -> Result<ApiResponse<ChatHistoryResponse>, ApiError> {
        self.client.get_with_params("/chat/history", request).await
    }

    pub async fn get_query(
        &self,
        query_id: &str,
    ) -> Result<ApiResponse<ChatQueryResponse>, ApiError> {
        self.client.get(&format!("/chat/queries/{query_id}")).await
    }

    pub async fn delete_query(&self, query_id: &str) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.delete(&format!("/chat/queries/{query_id}")).await
    }

    pub async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.post("/chat/feedback", request).await
    }

    pub async fn upload_file(
        &self,
        request: FileUploadRequest,
    ) -> Result<ApiResponse<FileUploadResponse>, ApiError> {
        self.client.upload("/chat/upload", request.into_multipart()).await
    }

    /// Export a chart. The body is the file itself, not an envelope.
    pub async fn download_chart(&self, request: &ChartDownloadRequest) -> Result<Bytes, ApiError> {
        self.client.download("/chat/download-chart", request).await
    }

    pub async fn create_session(
        &self,
        title: Option<&str>,
    ) -> Result<ApiResponse<SessionCreated>, ApiError> {
        self.client.post("/chat/sessions", &SessionTitle { title }).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<ApiResponse<Empty>, ApiError> {
        self.client.delete(&format!("/chat/sessions/{session_id}")).await
    }

    pub async fn rename_session(
        &self,
        session_id: &str,
        title: &str,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        self.client
            .put(&format!("/chat/sessions/{session_id}"), &SessionTitle { title: Some(title) })
            .await
    }
}
