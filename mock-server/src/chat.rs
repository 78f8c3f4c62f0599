//! `/chat` handlers.
//!
//! # Design
//! Every query gets the same canned sales answer. Sessions and queries are
//! owned by the user who created them; other users get 404, not 403.
//! Uploaded files are not kept, only previewed when they look like CSV.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    done, ok, ApiFailure, ApiResult, ChatSession, CurrentUser, Db, Feedback, Store, StoredQuery,
};

const PREVIEW_ROWS: usize = 5;
const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody {
    pub query: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub data_source_ids: Vec<String>,
    pub context: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub session_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Like,
    Dislike,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    pub query_id: String,
    pub feedback_type: FeedbackType,
    pub comment: Option<String>,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Png,
    Jpg,
    Pdf,
    Svg,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBody {
    pub query_id: String,
    pub format: ChartFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize)]
pub struct SessionBody {
    pub title: Option<String>,
}

fn new_session(store: &mut Store, user_id: &str, title: Option<String>) -> String {
    let now = Utc::now();
    let session = ChatSession {
        id: Uuid::new_v4().to_string(),
        title,
        user_id: user_id.to_string(),
        created_at: now,
        updated_at: now,
    };
    let id = session.id.clone();
    store.sessions.insert(id.clone(), session);
    id
}

fn owned_session<'a>(
    store: &'a mut Store,
    user: &CurrentUser,
    id: &str,
) -> ApiResult<&'a mut ChatSession> {
    store
        .sessions
        .get_mut(id)
        .filter(|s| s.user_id == user.id)
        .ok_or_else(|| ApiFailure::not_found(format!("session {id} not found")))
}

fn owned_query<'a>(store: &'a Store, user: &CurrentUser, id: &str) -> ApiResult<&'a StoredQuery> {
    store
        .queries
        .get(id)
        .filter(|q| q.user_id == user.id)
        .ok_or_else(|| ApiFailure::not_found(format!("query {id} not found")))
}

/// Canned sales answer: rows, a bar chart over them and the SQL used.
fn answer(query_id: &str, query: &str, session_id: &str) -> Value {
    let rows = [("north", 1250.0), ("south", 980.5), ("east", 1432.25), ("west", 760.0)];
    let data: Vec<Value> = rows
        .iter()
        .map(|(region, total)| json!({"region": region, "total": total}))
        .collect();
    let categories: Vec<&str> = rows.iter().map(|(region, _)| *region).collect();
    let totals: Vec<f64> = rows.iter().map(|(_, total)| *total).collect();
    json!({
        "id": query_id,
        "query": query,
        "sql": "SELECT region, SUM(amount) AS total FROM sales GROUP BY region",
        "data": data,
        "chart": {
            "type": "bar",
            "title": "Total sales by region",
            "data": {
                "categories": categories,
                "series": [{"name": "total", "values": totals}],
            },
            "options": {"legend": true},
        },
        "explanation": format!("Answered \"{query}\" by summing sales per region."),
        "suggestions": ["Compare with last quarter", "Break down north by product"],
        "sessionId": session_id,
        "executionTime": 42,
        "createdAt": Utc::now().to_rfc3339(),
    })
}

pub async fn query(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<QueryBody>,
) -> ApiResult {
    let text = input.query.trim();
    if text.is_empty() {
        return Err(ApiFailure::bad_request("query must not be empty"));
    }

    let mut store = db.write().await;
    let session_id = match input.session_id {
        Some(id) => {
            let session = owned_session(&mut store, &user, &id)?;
            session.updated_at = Utc::now();
            id
        }
        None => {
            let title: String = text.chars().take(30).collect();
            new_session(&mut store, &user.id, Some(title))
        }
    };

    let query_id = Uuid::new_v4().to_string();
    let response = answer(&query_id, text, &session_id);
    tracing::debug!(
        query_id = %query_id,
        data_sources = input.data_source_ids.len(),
        has_context = input.context.is_some(),
        "answered query"
    );
    store.queries.insert(
        query_id,
        StoredQuery {
            user_id: user.id,
            session_id,
            response: response.clone(),
        },
    );

    Ok(ok(response))
}

pub async fn history(
    State(db): State<Db>,
    user: CurrentUser,
    Query(params): Query<HistoryParams>,
) -> ApiResult {
    let store = db.read().await;
    let mut sessions: Vec<&ChatSession> = store
        .sessions
        .values()
        .filter(|s| s.user_id == user.id)
        .filter(|s| params.session_id.as_ref().is_none_or(|id| &s.id == id))
        .collect();
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let total = sessions.len();
    let page: Vec<Value> = sessions
        .into_iter()
        .skip(params.offset.unwrap_or(0))
        .take(params.limit.unwrap_or(usize::MAX))
        .map(ChatSession::to_json)
        .collect();

    Ok(ok(json!({"sessions": page, "total": total})))
}

pub async fn get_query(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let store = db.read().await;
    let stored = owned_query(&store, &user, &id)?;
    Ok(ok(stored.response.clone()))
}

pub async fn delete_query(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let mut store = db.write().await;
    owned_query(&store, &user, &id)?;
    store.queries.remove(&id);
    Ok(done("query deleted"))
}

pub async fn feedback(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<FeedbackBody>,
) -> ApiResult {
    let mut store = db.write().await;
    owned_query(&store, &user, &input.query_id)?;
    let feedback_type = match input.feedback_type {
        FeedbackType::Like => "like",
        FeedbackType::Dislike => "dislike",
    };
    store.feedback.push(Feedback {
        query_id: input.query_id,
        user_id: user.id,
        feedback_type: feedback_type.to_string(),
        comment: input.comment,
    });
    Ok(done("feedback recorded"))
}

fn csv_preview(text: &str) -> Vec<Value> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    lines
        .take(PREVIEW_ROWS)
        .map(|line| {
            let row: Map<String, Value> = columns
                .iter()
                .zip(line.split(',').map(str::trim))
                .map(|(col, cell)| (col.to_string(), Value::from(cell)))
                .collect();
            Value::Object(row)
        })
        .collect()
}

pub async fn upload(_user: CurrentUser, mut multipart: Multipart) -> ApiResult {
    let mut file = None;
    let mut file_name = None;
    let mut file_type = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiFailure::bad_request(format!("failed to read field {name}: {e}")))?;
        match name.as_str() {
            "file" => file = Some(bytes),
            "fileName" => file_name = Some(String::from_utf8_lossy(&bytes).into_owned()),
            "fileType" => file_type = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiFailure::bad_request("missing file field"))?;
    let file_name = file_name.unwrap_or_else(|| "upload.bin".to_string());
    let file_type = file_type.unwrap_or_default();
    let file_id = Uuid::new_v4().to_string();

    let mut data = json!({
        "fileId": file_id,
        "fileName": file_name,
        "fileUrl": format!("/files/{file_id}"),
    });
    if file_type == "text/csv" || file_name.ends_with(".csv") {
        data["previewData"] = Value::Array(csv_preview(&String::from_utf8_lossy(&file)));
    }
    tracing::debug!(file_id = %file_id, size = file.len(), "stored upload");

    Ok(ok(data))
}

fn render_chart(
    format: ChartFormat,
    query_id: &str,
    width: u32,
    height: u32,
) -> (&'static str, Vec<u8>) {
    let tagged = |magic: &[u8]| [magic, query_id.as_bytes()].concat();
    match format {
        ChartFormat::Svg => {
            let open = format!(r#"<svg xmlns="{SVG_NS}" width="{width}" height="{height}">"#);
            let svg = format!("{open}<title>{query_id}</title></svg>");
            ("image/svg+xml", svg.into_bytes())
        }
        ChartFormat::Png => ("image/png", tagged(b"\x89PNG\r\n\x1a\n".as_slice())),
        ChartFormat::Jpg => ("image/jpeg", tagged(b"\xff\xd8\xff".as_slice())),
        ChartFormat::Pdf => ("application/pdf", tagged(b"%PDF-1.4\n".as_slice())),
    }
}

pub async fn download_chart(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<DownloadBody>,
) -> ApiResult<Response> {
    let store = db.read().await;
    owned_query(&store, &user, &input.query_id)?;

    let (content_type, body) = render_chart(
        input.format,
        &input.query_id,
        input.width.unwrap_or(800),
        input.height.unwrap_or(600),
    );
    Ok(([(CONTENT_TYPE, content_type)], body).into_response())
}

pub async fn create_session(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<SessionBody>,
) -> ApiResult {
    let mut store = db.write().await;
    let id = new_session(&mut store, &user.id, input.title);
    Ok(ok(json!({"sessionId": id})))
}

pub async fn rename_session(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<SessionBody>,
) -> ApiResult {
    let mut store = db.write().await;
    let session = owned_session(&mut store, &user, &id)?;
    session.title = input.title;
    session.updated_at = Utc::now();
    Ok(done("session renamed"))
}

pub async fn delete_session(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let mut store = db.write().await;
    owned_session(&mut store, &user, &id)?;
    store.sessions.remove(&id);
    store.queries.retain(|_, q| q.session_id != id);
    Ok(done("session deleted"))
}
