//! UserInfo endpoint models (`/auth/userinfo`, `/issue`).

use serde::{Deserialize, Serialize};

/// Request body for `/auth/userinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoRequest {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htu: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserInfoAction {
    InternalServerError,
    BadRequest,
    Unauthorized,
    Forbidden,
    Ok,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/userinfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfoResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: UserInfoAction,

    /// Value for the `WWW-Authenticate` header on failure.
    pub response_content: Option<String>,
    pub client_id: Option<i64>,
    pub subject: Option<String>,
    pub scopes: Vec<String>,

    /// Claim names to release.
    pub claims: Vec<String>,
    pub claims_locales: Vec<String>,
    pub token: Option<String>,
    pub dpop_nonce: Option<String>,
}

/// Request body for `/auth/userinfo/issue`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoIssueRequest {
    pub token: String,

    /// JSON object of claim values, serialized to a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htu: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserInfoIssueAction {
    InternalServerError,
    BadRequest,
    Unauthorized,
    Forbidden,
    Json,
    Jwt,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/userinfo/issue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfoIssueResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: UserInfoIssueAction,
    pub response_content: Option<String>,
    pub dpop_nonce: Option<String>,
}
