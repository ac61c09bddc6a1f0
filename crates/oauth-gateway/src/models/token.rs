//! Token endpoint models (`/auth/token`, `/issue`, `/fail`).

use serde::{Deserialize, Serialize};

use super::{ClientCredentials, DpopContext};

/// Request body for `/auth/token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// Form-encoded body of the incoming token request.
    pub parameters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htu: Option<String>,
}

impl TokenRequest {
    /// Build from the raw body and the extracted request context.
    #[must_use]
    pub fn new(parameters: String, credentials: ClientCredentials, dpop: DpopContext) -> Self {
        Self {
            parameters,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            client_certificate: credentials.client_certificate,
            dpop: dpop.dpop,
            htm: Some(dpop.htm),
            htu: Some(dpop.htu),
        }
    }
}

/// Next step dictated by the backend for a token request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenAction {
    InvalidClient,
    InternalServerError,
    BadRequest,
    Password,
    Ok,
    TokenExchange,
    JwtBearer,
    IdTokenReissuable,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/token`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: TokenAction,
    pub response_content: Option<String>,

    /// Resource owner credentials for the password grant.
    pub username: Option<String>,
    pub password: Option<String>,

    /// Handle for the follow-up issue/fail call (password grant).
    pub ticket: Option<String>,
    pub grant_type: Option<String>,
    pub client_id: Option<i64>,
    pub subject: Option<String>,
    pub scopes: Vec<String>,
    pub dpop_nonce: Option<String>,
}

/// Request body for `/auth/token/issue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIssueRequest {
    pub ticket: String,
    pub subject: String,
}

/// Result of `/auth/token/issue`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenIssueAction {
    InternalServerError,
    Ok,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/token/issue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenIssueResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: TokenIssueAction,
    pub response_content: Option<String>,
    pub access_token: Option<String>,
}

/// Why a token request is being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenFailReason {
    Unknown,
    InvalidResourceOwnerCredentials,
    InvalidTarget,
}

/// Request body for `/auth/token/fail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenFailRequest {
    pub ticket: String,
    pub reason: TokenFailReason,
}

/// Result of `/auth/token/fail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenFailAction {
    InternalServerError,
    BadRequest,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/token/fail`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenFailResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: TokenFailAction,
    pub response_content: Option<String>,
}
