//! Query, session, upload and chart payloads.
//!
//! # Design
//! Chart data is a `ChartKind` enum tagged by `type`, flattened into
//! `ChartConfig` next to the shared title and size fields. Result rows,
//! previews and query context have no fixed schema and stay JSON maps.
//! `FileUploadRequest` is not serialized; it turns into a multipart form.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::JsonObject;
use crate::http::MultipartBody;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_ids: Option<Vec<String>>,
    /// Passed through to the query engine untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Scatter,
    Table,
}

/// Chart rendered next to a query answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(flatten)]
    pub kind: ChartKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Renderer options. Free-form.
    #[serde(default)]
    pub options: JsonObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ChartConfig {
    pub fn chart_type(&self) -> ChartType {
        match self.kind {
            ChartKind::Line { .. } => ChartType::Line,
            ChartKind::Bar { .. } => ChartType::Bar,
            ChartKind::Pie { .. } => ChartType::Pie,
            ChartKind::Scatter { .. } => ChartType::Scatter,
            ChartKind::Table { .. } => ChartType::Table,
        }
    }
}

/// Chart data, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartKind {
    Line { data: SeriesData },
    Bar { data: SeriesData },
    Pie { data: PieData },
    Scatter { data: ScatterData },
    Table { data: TableData },
}

/// Category axis plus one or more numeric series of the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieData {
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    pub series: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    /// `[x, y]` pairs.
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQueryResponse {
    pub id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// Result rows keyed by column name.
    #[serde(default)]
    pub data: Vec<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartConfig>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub session_id: String,
    /// Milliseconds.
    pub execution_time: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub query_id: String,
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub user_id: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub sessions: Vec<ChatSession>,
    pub total: u64,
}

/// A file to send to `/chat/upload`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUploadRequest {
    pub file: Bytes,
    pub file_name: String,
    /// MIME type, e.g. `text/csv`.
    pub file_type: String,
}

impl FileUploadRequest {
    /// Form layout expected by the upload endpoint.
    pub fn into_multipart(self) -> MultipartBody {
        MultipartBody::new()
            .file("file", self.file_name.clone(), self.file_type.clone(), self.file)
            .text("fileName", self.file_name)
            .text("fileType", self.file_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub file_id: String,
    pub file_name: String,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<Vec<JsonObject>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Png,
    Jpg,
    Pdf,
    Svg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDownloadRequest {
    pub query_id: String,
    pub format: ChartFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionTitle<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::MultipartValue;

    #[test]
    fn chart_config_is_tagged_by_type() {
        let value = json!({
            "type": "bar",
            "title": "Revenue by region",
            "data": {
                "categories": ["north", "south"],
                "series": [{"name": "2024", "values": [12.5, 7.0]}]
            },
            "options": {"stacked": false},
            "height": 320
        });
        let chart: ChartConfig = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(chart.chart_type(), ChartType::Bar);
        assert_eq!(chart.height, Some(320));
        match &chart.kind {
            ChartKind::Bar { data } => assert_eq!(data.series[0].values, vec![12.5, 7.0]),
            other => panic!("unexpected chart kind: {other:?}"),
        }
        assert_eq!(serde_json::to_value(&chart).unwrap(), value);
    }

    #[test]
    fn chart_options_default_to_empty() {
        let chart: ChartConfig = serde_json::from_value(json!({
            "type": "pie",
            "data": {"slices": [{"label": "mobile", "value": 60.0}]}
        }))
        .unwrap();
        assert_eq!(chart.chart_type(), ChartType::Pie);
        assert!(chart.options.is_empty());
    }

    #[test]
    fn unknown_chart_type_is_rejected() {
        let result = serde_json::from_value::<ChartConfig>(json!({"type": "radar", "data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn query_response_with_table_chart() {
        let response: ChatQueryResponse = serde_json::from_value(json!({
            "id": "q1",
            "query": "top customers",
            "sql": "SELECT name, total FROM customers ORDER BY total DESC LIMIT 2",
            "data": [{"name": "Acme", "total": 10}],
            "chart": {
                "type": "table",
                "data": {"columns": ["name", "total"], "rows": [["Acme", 10]]}
            },
            "explanation": "Sorted by total.",
            "sessionId": "s1",
            "executionTime": 42,
            "createdAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(response.chart.unwrap().chart_type(), ChartType::Table);
        assert_eq!(response.data[0]["name"], "Acme");
        assert_eq!(response.suggestions, None);
    }

    #[test]
    fn upload_request_form_layout() {
        let form = FileUploadRequest {
            file: Bytes::from_static(b"region,total\nnorth,1\n"),
            file_name: "sales.csv".to_string(),
            file_type: "text/csv".to_string(),
        }
        .into_multipart();

        assert_eq!(form.fields.len(), 3);
        match &form.fields[0].value {
            MultipartValue::File { file_name, content_type, .. } => {
                assert_eq!(file_name, "sales.csv");
                assert_eq!(content_type, "text/csv");
            }
            other => panic!("expected file part, got {other:?}"),
        }
        assert_eq!(form.text_field("fileName"), Some("sales.csv"));
        assert_eq!(form.text_field("fileType"), Some("text/csv"));
    }

    #[test]
    fn history_request_skips_unset_params() {
        let request = ChatHistoryRequest {
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"limit": 20}));
    }
}
