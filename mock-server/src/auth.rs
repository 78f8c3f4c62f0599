//! `/auth` handlers.
//!
//! # Design
//! Logins issue an opaque access/refresh pair and set the access token as
//! the session cookie too. Only bearer tokens authorize requests; the
//! cookie is reported by `validate` and nothing else.

use axum::{
    extract::State,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap,
    },
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    authenticate, done, ok, validate_password, ApiFailure, ApiResult, CurrentUser, Db, Role, User,
    SESSION_COOKIE, TOKEN_TTL_SECS,
};

type WithCookie = ([(axum::http::HeaderName, String); 1], Json<Value>);

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoLoginBody {
    pub sso_token: String,
    pub provider: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

fn session_cookie(access: &str) -> String {
    format!("{SESSION_COOKIE}={access}; Path=/; HttpOnly; SameSite=Lax")
}

fn session_from_cookies(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Login answers also carry the access token as a session cookie.
fn login_payload(user: &User, access: String, refresh: String) -> WithCookie {
    let cookie = session_cookie(&access);
    let body = ok(json!({
        "accessToken": access,
        "refreshToken": refresh,
        "tokenType": "bearer",
        "expiresIn": TOKEN_TTL_SECS,
        "user": user.info(),
    }));
    ([(SET_COOKIE, cookie)], body)
}

pub async fn login(State(db): State<Db>, Json(input): Json<LoginBody>) -> ApiResult<WithCookie> {
    let mut store = db.write().await;
    let user_id = match store.user_by_email(&input.email) {
        Some(user) if user.password == input.password && !user.is_active => {
            return Err(ApiFailure::forbidden("account is deactivated"));
        }
        Some(user) if user.password == input.password => user.id.clone(),
        _ => return Err(ApiFailure::unauthorized("invalid email or password")),
    };
    let (access, refresh) = store.issue_tokens(&user_id);

    let user = store
        .users
        .get_mut(&user_id)
        .ok_or_else(|| ApiFailure::unauthorized("invalid email or password"))?;
    user.last_login = Some(Utc::now());
    user.login_count += 1;
    tracing::info!(user = %user.email, "login");

    Ok(login_payload(user, access, refresh))
}

pub async fn sso_login(
    State(db): State<Db>,
    Json(input): Json<SsoLoginBody>,
) -> ApiResult<WithCookie> {
    if input.sso_token.trim().is_empty() {
        return Err(ApiFailure::bad_request("ssoToken must not be empty"));
    }
    let provider = input.provider.unwrap_or_else(|| "sso".to_string());
    let email = format!("{}@{}.sso", input.sso_token, provider);

    let mut store = db.write().await;
    let existing = store.user_by_email(&email).map(|user| user.id.clone());
    let user_id = match existing {
        Some(id) => id,
        None => {
            let user = User::new(&email, None, Role::Client, &uuid::Uuid::new_v4().to_string());
            let id = user.id.clone();
            store.users.insert(id.clone(), user);
            id
        }
    };
    let (access, refresh) = store.issue_tokens(&user_id);

    let user = store
        .users
        .get_mut(&user_id)
        .ok_or_else(|| ApiFailure::unauthorized("unknown SSO user"))?;
    user.last_login = Some(Utc::now());
    user.login_count += 1;

    Ok(login_payload(user, access, refresh))
}

pub async fn refresh(State(db): State<Db>, Json(input): Json<RefreshBody>) -> ApiResult {
    let mut store = db.write().await;
    let user_id = store
        .refresh_tokens
        .get(&input.refresh_token)
        .cloned()
        .ok_or_else(|| ApiFailure::unauthorized("invalid refresh token"))?;

    let access = uuid::Uuid::new_v4().to_string();
    store.access_tokens.insert(access.clone(), user_id);

    Ok(ok(json!({"accessToken": access, "expiresIn": TOKEN_TTL_SECS})))
}

pub async fn logout(State(db): State<Db>, user: CurrentUser) -> ApiResult {
    db.write().await.access_tokens.remove(&user.token);
    Ok(done("logged out"))
}

pub async fn me(State(db): State<Db>, user: CurrentUser) -> ApiResult {
    let store = db.read().await;
    let user = store
        .users
        .get(&user.id)
        .ok_or_else(|| ApiFailure::not_found("user not found"))?;
    Ok(ok(user.info()))
}

pub async fn change_password(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<ChangePasswordBody>,
) -> ApiResult {
    validate_password(&input.new_password)?;

    let mut store = db.write().await;
    let user = store
        .users
        .get_mut(&user.id)
        .ok_or_else(|| ApiFailure::not_found("user not found"))?;
    if user.password != input.current_password {
        return Err(ApiFailure::bad_request("current password is incorrect"));
    }
    user.password = input.new_password;
    user.updated_at = Utc::now();

    Ok(done("password changed"))
}

pub async fn update_profile(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<ProfileBody>,
) -> ApiResult {
    let mut store = db.write().await;
    if let Some(email) = &input.email {
        if store.user_by_email(email).is_some_and(|other| other.id != user.id) {
            return Err(ApiFailure::conflict(format!("email {email} is already in use")));
        }
    }

    let user = store
        .users
        .get_mut(&user.id)
        .ok_or_else(|| ApiFailure::not_found("user not found"))?;
    if let Some(full_name) = input.full_name {
        user.full_name = Some(full_name);
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    user.updated_at = Utc::now();

    Ok(ok(user.info()))
}

/// Reports `valid: false` instead of failing when the bearer token is
/// unknown. `session` tells whether the session cookie names a live token.
pub async fn validate(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let valid = authenticate(&db, &headers).await.is_ok();
    let session = match session_from_cookies(&headers) {
        Some(token) => db.read().await.access_tokens.contains_key(token),
        None => false,
    };
    Ok(ok(json!({"valid": valid, "session": session})))
}
