//! Login, token and profile payloads.
//!
//! # Design
//! Field names are camelCase on the wire. `UserInfo` is the signed-in
//! user's own view and carries the role's permissions.

use serde::{Deserialize, Serialize};

use super::common::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoLoginRequest {
    pub sso_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until `access_token` expires.
    pub expires_in: u64,
    pub user: UserInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// The signed-in user as seen by the apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn login_response_from_wire() {
        let value = json!({
            "accessToken": "a",
            "refreshToken": "r",
            "tokenType": "bearer",
            "expiresIn": 3600,
            "user": {
                "id": "u1",
                "email": "admin@wenshu.local",
                "role": "ADMIN",
                "permissions": ["users:read"],
                "isActive": true,
                "createdAt": "2025-01-01T00:00:00Z"
            }
        });
        let login: LoginResponse = serde_json::from_value(value).unwrap();
        assert_eq!(login.user.role, UserRole::Admin);
        assert_eq!(login.user.full_name, None);
        assert_eq!(login.expires_in, 3600);
    }

    #[test]
    fn partial_profile_update_omits_unset_fields() {
        let request = UpdateProfileRequest {
            full_name: Some("Li Wei".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"fullName": "Li Wei"}));
    }

    #[test]
    fn sso_request_wire_names() {
        let request = SsoLoginRequest {
            sso_token: "tok".to_string(),
            provider: Some("dingtalk".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"ssoToken": "tok", "provider": "dingtalk"})
        );
    }
}
