//! In-memory mock of the wenshu REST API.
//!
//! # Design
//! Every JSON endpoint answers with the `{success, data, message, error,
//! code}` envelope; failures use the matching HTTP status and put the
//! human-readable text in `message`. State lives in a single
//! `RwLock<Store>` behind an `Arc`, fresh for each `app()` call, and is
//! seeded with one administrator (`ADMIN_EMAIL` / `ADMIN_PASSWORD`).
//! Bearer tokens are opaque UUIDs mapped to user ids; nothing expires.

mod auth;
mod chat;
mod users;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@wenshu.local";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const TOKEN_TTL_SECS: u64 = 3600;
/// Cookie set on login holding the access token.
pub const SESSION_COOKIE: &str = "wenshu_session";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Admin,
    Superadmin,
}

impl Role {
    fn permissions(self) -> Vec<&'static str> {
        match self {
            Role::Client => vec!["chat:query"],
            Role::Admin => vec!["chat:query", "users:read", "users:write"],
            Role::Superadmin => vec!["chat:query", "users:read", "users:write", "system:admin"],
        }
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub password: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    fn new(email: &str, full_name: Option<String>, role: Role, password: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            full_name,
            role,
            password: password.to_string(),
            is_active: true,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "fullName": self.full_name,
            "role": self.role,
            "isActive": self.is_active,
            "lastLogin": self.last_login.map(|t| t.to_rfc3339()),
            "createdAt": self.created_at.to_rfc3339(),
        })
    }

    fn info(&self) -> Value {
        let mut value = self.summary();
        value["permissions"] = json!(self.role.permissions());
        value
    }

    fn detail(&self) -> Value {
        let mut value = self.info();
        value["updatedAt"] = json!(self.updated_at.to_rfc3339());
        value["loginCount"] = json!(self.login_count);
        value
    }
}

#[derive(Clone, Debug)]
pub struct ChatSession {
    pub id: String,
    pub title: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "userId": self.user_id,
            "isActive": true,
            "createdAt": self.created_at.to_rfc3339(),
            "updatedAt": self.updated_at.to_rfc3339(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct StoredQuery {
    pub user_id: String,
    pub session_id: String,
    pub response: Value,
}

#[derive(Clone, Debug)]
pub struct Feedback {
    pub query_id: String,
    pub user_id: String,
    pub feedback_type: String,
    pub comment: Option<String>,
}

#[derive(Default)]
pub struct Store {
    pub users: HashMap<String, User>,
    pub access_tokens: HashMap<String, String>,
    pub refresh_tokens: HashMap<String, String>,
    pub sessions: HashMap<String, ChatSession>,
    pub queries: HashMap<String, StoredQuery>,
    pub feedback: Vec<Feedback>,
    pub invitations: Vec<(String, Role)>,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Self::default();
        let name = Some("Administrator".to_string());
        let admin = User::new(ADMIN_EMAIL, name, Role::Admin, ADMIN_PASSWORD);
        store.users.insert(admin.id.clone(), admin);
        store
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Issue a fresh access/refresh token pair for `user_id`.
    fn issue_tokens(&mut self, user_id: &str) -> (String, String) {
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();
        self.access_tokens.insert(access.clone(), user_id.to_string());
        self.refresh_tokens.insert(refresh.clone(), user_id.to_string());
        (access, refresh)
    }

    fn revoke_user_tokens(&mut self, user_id: &str) {
        self.access_tokens.retain(|_, owner| owner != user_id);
        self.refresh_tokens.retain(|_, owner| owner != user_id);
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Failure envelope with its HTTP status.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let error = self
            .status
            .canonical_reason()
            .unwrap_or("Error")
            .to_uppercase()
            .replace(' ', "_");
        let body = json!({
            "success": false,
            "message": self.message,
            "error": error,
            "code": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T = Json<Value>> = Result<T, ApiFailure>;

fn ok(data: Value) -> Json<Value> {
    Json(json!({"success": true, "data": data}))
}

fn done(message: &str) -> Json<Value> {
    Json(json!({"success": true, "message": message}))
}

/// The user behind the request's bearer token.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
    pub token: String,
}

impl CurrentUser {
    fn require_admin(&self) -> ApiResult<()> {
        match self.role {
            Role::Admin | Role::Superadmin => Ok(()),
            Role::Client => Err(ApiFailure::forbidden("administrator role required")),
        }
    }
}

async fn authenticate(db: &Db, headers: &HeaderMap) -> ApiResult<CurrentUser> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiFailure::unauthorized("missing bearer token"))?;

    let store = db.read().await;
    let user = store
        .access_tokens
        .get(token)
        .and_then(|id| store.users.get(id))
        .ok_or_else(|| ApiFailure::unauthorized("invalid or expired token"))?;
    if !user.is_active {
        return Err(ApiFailure::forbidden("account is deactivated"));
    }

    Ok(CurrentUser {
        id: user.id.clone(),
        role: user.role,
        token: token.to_string(),
    })
}

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        authenticate(db, &parts.headers).await
    }
}

fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiFailure::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/sso-login", post(auth::sso_login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/validate", get(auth::validate))
        .route("/chat/query", post(chat::query))
        .route("/chat/history", get(chat::history))
        .route("/chat/queries/{id}", get(chat::get_query).delete(chat::delete_query))
        .route("/chat/feedback", post(chat::feedback))
        .route("/chat/upload", post(chat::upload))
        .route("/chat/download-chart", post(chat::download_chart))
        .route("/chat/sessions", post(chat::create_session))
        .route("/chat/sessions/{id}", put(chat::rename_session).delete(chat::delete_session))
        .route("/users", get(users::list).post(users::create))
        .route("/users/stats", get(users::stats))
        .route("/users/batch", post(users::batch))
        .route("/users/invite", post(users::invite))
        .route("/users/{id}", get(users::get_user).put(users::update).delete(users::delete))
        .route("/users/{id}/activate", post(users::activate))
        .route("/users/{id}/deactivate", post(users::deactivate))
        .route("/users/{id}/reset-password", post(users::reset_password))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_envelope_shape() {
        use http_body_util::BodyExt;

        let response = ApiFailure::not_found("query q1 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "query q1 not found",
                "error": "NOT_FOUND",
                "code": 404,
            })
        );
    }

    #[test]
    fn user_views_nest() {
        let user = User::new("a@b.c", None, Role::Client, "secret1");
        let summary = user.summary();
        assert_eq!(summary["role"], "CLIENT");
        assert!(summary.get("permissions").is_none());

        let info = user.info();
        assert_eq!(info["permissions"], json!(["chat:query"]));

        let detail = user.detail();
        assert_eq!(detail["loginCount"], 0);
        assert_eq!(detail["email"], "a@b.c");
        assert!(detail.get("password").is_none());
    }

    #[test]
    fn seeded_store_has_admin() {
        let store = Store::seeded();
        let admin = store.user_by_email("ADMIN@wenshu.local").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_active);
    }

    #[test]
    fn issued_tokens_are_revocable() {
        let mut store = Store::seeded();
        let (access, refresh) = store.issue_tokens("u1");
        assert_eq!(store.access_tokens.get(&access).map(String::as_str), Some("u1"));
        store.revoke_user_tokens("u1");
        assert!(!store.access_tokens.contains_key(&access));
        assert!(!store.refresh_tokens.contains_key(&refresh));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
