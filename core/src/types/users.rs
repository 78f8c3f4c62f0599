//! User administration payloads.
//!
//! # Design
//! `UserQueryParams` serializes into the list endpoint's query string, so
//! its field order is the order parameters appear on the wire. `UserDetail`
//! extends `UserSummary` through `#[serde(flatten)]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::common::{SortOrder, UserRole, UserStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: UserRole,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Pagination, sorting and filtering for the user list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub updated_at: String,
    pub login_count: u64,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUserOperationRequest {
    pub user_ids: Vec<String>,
    pub operation: BatchOperation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    pub inactive_users: u64,
    #[serde(default)]
    pub users_by_role: HashMap<UserRole, u64>,
    pub recent_registrations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryPassword {
    pub temporary_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteUserRequest {
    pub email: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::request::query_pairs;

    #[test]
    fn query_params_keep_declaration_order() {
        let params = UserQueryParams {
            page: Some(2),
            limit: Some(20),
            search: Some("li".to_string()),
            role: Some(UserRole::Admin),
            is_active: Some(true),
            ..Default::default()
        };
        let pairs = query_pairs(&params).unwrap();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["page", "limit", "search", "role", "isActive"]);
        assert_eq!(pairs[3].1, "ADMIN");
    }

    #[test]
    fn user_detail_flattens_summary() {
        let detail: UserDetail = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@b.c",
            "role": "CLIENT",
            "isActive": false,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-02-01T00:00:00Z",
            "loginCount": 3
        }))
        .unwrap();
        assert_eq!(detail.summary.role, UserRole::Client);
        assert!(!detail.summary.is_active);
        assert_eq!(detail.login_count, 3);
        assert!(detail.permissions.is_empty());
    }

    #[test]
    fn stats_keyed_by_role() {
        let stats: UserStats = serde_json::from_value(json!({
            "totalUsers": 3,
            "activeUsers": 2,
            "inactiveUsers": 1,
            "usersByRole": {"ADMIN": 1, "CLIENT": 2},
            "recentRegistrations": 1
        }))
        .unwrap();
        assert_eq!(stats.users_by_role[&UserRole::Client], 2);
        assert_eq!(stats.users_by_role.get(&UserRole::Superadmin), None);
    }

    #[test]
    fn batch_request_wire_shape() {
        let request = BatchUserOperationRequest {
            user_ids: vec!["u1".to_string(), "u2".to_string()],
            operation: BatchOperation::Deactivate,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"userIds": ["u1", "u2"], "operation": "deactivate"})
        );
    }
}
