//! The uniform response envelope every JSON endpoint returns.

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

/// Success/failure wrapper around an endpoint payload.
///
/// Values handed back by the client always have `success == true` and
/// `data == Some(_)`; failure envelopes are converted into
/// [`ApiError`](crate::ApiError) before they reach the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Take the payload out of the envelope.
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Payload of endpoints that answer without data.
///
/// Accepts and discards whatever the server puts in `data`, including
/// nothing at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty;

impl<'de> Deserialize<'de> for Empty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Empty)
    }
}
