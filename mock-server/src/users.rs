//! `/users` handlers. Every route requires an administrator.
//!
//! # Design
//! Deactivating or deleting a user revokes their tokens at once. Batch
//! operations check every id before touching any user.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{done, ok, validate_password, ApiFailure, ApiResult, CurrentUser, Db, Role, Store, User};

const DEFAULT_PAGE_SIZE: usize = 20;
const RECENT_DAYS: i64 = 7;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub password: String,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
    pub user_ids: Vec<String>,
    pub operation: BatchOperation,
}

#[derive(Deserialize)]
pub struct InviteBody {
    pub email: String,
    pub role: Role,
}

fn matches(user: &User, params: &ListParams) -> bool {
    let search = params.search.as_deref().map(str::to_lowercase);
    let found = search.is_none_or(|needle| {
        user.email.to_lowercase().contains(&needle)
            || user
                .full_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
    });
    let active = params.is_active.or(match params.status.as_deref() {
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        _ => None,
    });
    found
        && params.role.is_none_or(|role| user.role == role)
        && active.is_none_or(|a| user.is_active == a)
}

fn user_mut<'a>(store: &'a mut Store, id: &str) -> ApiResult<&'a mut User> {
    store
        .users
        .get_mut(id)
        .ok_or_else(|| ApiFailure::not_found(format!("user {id} not found")))
}

fn set_active(store: &mut Store, id: &str, active: bool) -> ApiResult<()> {
    let user = user_mut(store, id)?;
    user.is_active = active;
    user.updated_at = Utc::now();
    if !active {
        store.revoke_user_tokens(id);
    }
    Ok(())
}

fn remove_user(store: &mut Store, current: &CurrentUser, id: &str) -> ApiResult<()> {
    if id == current.id {
        return Err(ApiFailure::bad_request("cannot delete your own account"));
    }
    store
        .users
        .remove(id)
        .ok_or_else(|| ApiFailure::not_found(format!("user {id} not found")))?;
    store.revoke_user_tokens(id);
    Ok(())
}

pub async fn list(
    State(db): State<Db>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> ApiResult {
    user.require_admin()?;

    let store = db.read().await;
    let mut users: Vec<&User> = store.users.values().filter(|u| matches(u, &params)).collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let total = users.len();
    let rows: Vec<Value> = users
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .map(User::summary)
        .collect();

    Ok(ok(json!({
        "users": rows,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total.div_ceil(limit),
    })))
}

pub async fn get_user(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    user.require_admin()?;
    let store = db.read().await;
    let found = store
        .users
        .get(&id)
        .ok_or_else(|| ApiFailure::not_found(format!("user {id} not found")))?;
    Ok(ok(found.detail()))
}

pub async fn create(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<CreateBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    user.require_admin()?;
    validate_password(&input.password)?;

    let mut store = db.write().await;
    if store.user_by_email(&input.email).is_some() {
        return Err(ApiFailure::conflict(format!("email {} is already registered", input.email)));
    }
    let mut created = User::new(&input.email, input.full_name, input.role, &input.password);
    created.is_active = input.is_active.unwrap_or(true);
    let detail = created.detail();
    tracing::info!(user = %created.email, role = ?created.role, "created user");
    store.users.insert(created.id.clone(), created);

    Ok((StatusCode::CREATED, ok(detail)))
}

pub async fn update(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateBody>,
) -> ApiResult {
    user.require_admin()?;

    let mut store = db.write().await;
    let target = user_mut(&mut store, &id)?;
    if let Some(full_name) = input.full_name {
        target.full_name = Some(full_name);
    }
    if let Some(role) = input.role {
        target.role = role;
    }
    if let Some(active) = input.is_active {
        target.is_active = active;
    }
    target.updated_at = Utc::now();
    let detail = target.detail();
    if input.is_active == Some(false) {
        store.revoke_user_tokens(&id);
    }

    Ok(ok(detail))
}

pub async fn delete(State(db): State<Db>, user: CurrentUser, Path(id): Path<String>) -> ApiResult {
    user.require_admin()?;
    remove_user(&mut *db.write().await, &user, &id)?;
    Ok(done("user deleted"))
}

pub async fn activate(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    user.require_admin()?;
    set_active(&mut *db.write().await, &id, true)?;
    Ok(done("user activated"))
}

pub async fn deactivate(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    user.require_admin()?;
    if id == user.id {
        return Err(ApiFailure::bad_request("cannot deactivate your own account"));
    }
    set_active(&mut *db.write().await, &id, false)?;
    Ok(done("user deactivated"))
}

/// Applies `operation` to every id, or to none if any id is unknown.
pub async fn batch(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<BatchBody>,
) -> ApiResult {
    user.require_admin()?;

    let mut store = db.write().await;
    if let Some(missing) = input.user_ids.iter().find(|id| !store.users.contains_key(*id)) {
        return Err(ApiFailure::not_found(format!("user {missing} not found")));
    }
    if !matches!(input.operation, BatchOperation::Activate) && input.user_ids.contains(&user.id) {
        return Err(ApiFailure::bad_request("batch operation must not include your own account"));
    }

    for id in &input.user_ids {
        match input.operation {
            BatchOperation::Activate => set_active(&mut store, id, true)?,
            BatchOperation::Deactivate => set_active(&mut store, id, false)?,
            BatchOperation::Delete => remove_user(&mut store, &user, id)?,
        }
    }

    Ok(done(&format!("{} users updated", input.user_ids.len())))
}

pub async fn stats(State(db): State<Db>, user: CurrentUser) -> ApiResult {
    user.require_admin()?;

    let store = db.read().await;
    let total = store.users.len();
    let active = store.users.values().filter(|u| u.is_active).count();
    let mut by_role: BTreeMap<String, u64> = BTreeMap::new();
    for u in store.users.values() {
        let key = serde_json::to_value(u.role)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        *by_role.entry(key).or_default() += 1;
    }
    let since = Utc::now() - Duration::days(RECENT_DAYS);
    let recent = store.users.values().filter(|u| u.created_at >= since).count();

    Ok(ok(json!({
        "totalUsers": total,
        "activeUsers": active,
        "inactiveUsers": total - active,
        "usersByRole": by_role,
        "recentRegistrations": recent,
    })))
}

pub async fn reset_password(
    State(db): State<Db>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    user.require_admin()?;

    let mut store = db.write().await;
    let temporary = format!("Tmp-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let target = user_mut(&mut store, &id)?;
    target.password = temporary.clone();
    target.updated_at = Utc::now();
    store.revoke_user_tokens(&id);

    Ok(ok(json!({"temporaryPassword": temporary})))
}

pub async fn invite(
    State(db): State<Db>,
    user: CurrentUser,
    Json(input): Json<InviteBody>,
) -> ApiResult {
    user.require_admin()?;

    let mut store = db.write().await;
    if store.user_by_email(&input.email).is_some() {
        return Err(ApiFailure::conflict(format!("email {} is already registered", input.email)));
    }
    tracing::info!(email = %input.email, role = ?input.role, "invitation sent");
    store.invitations.push((input.email, input.role));

    Ok(done("invitation sent"))
}
