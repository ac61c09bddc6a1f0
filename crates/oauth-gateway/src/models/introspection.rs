//! Introspection models.
//!
//! `/auth/introspection` is the resource-server side check of a presented
//! access token; `/auth/introspection/standard` backs the RFC 7662 endpoint.

use serde::{Deserialize, Serialize};

/// Request body for `/auth/introspection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionRequest {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htu: Option<String>,
}

/// Verdict on a presented access token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntrospectionAction {
    InternalServerError,
    BadRequest,
    Unauthorized,
    Forbidden,
    Ok,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/introspection`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntrospectionResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: IntrospectionAction,

    /// Value for the `WWW-Authenticate` header on failure.
    pub response_content: Option<String>,
    pub client_id: Option<i64>,
    pub subject: Option<String>,
    pub scopes: Vec<String>,
    pub existent: bool,
    pub usable: bool,
    pub sufficient: bool,
    pub refreshable: bool,

    /// Expiry in milliseconds since the epoch.
    pub expires_at: Option<i64>,
    pub certificate_thumbprint: Option<String>,
    pub resources: Vec<String>,
    pub dpop_nonce: Option<String>,
    pub auth_time: Option<i64>,
    pub acr: Option<String>,
    pub issuable_credentials: Option<String>,
}

/// Request body for `/auth/introspection/standard`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardIntrospectionRequest {
    /// Form-encoded body of the incoming introspection request.
    pub parameters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_accept_header: Option<String>,
    pub with_hidden_properties: bool,
}

/// Result of a standard introspection request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandardIntrospectionAction {
    InternalServerError,
    BadRequest,
    Ok,
    Jwt,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/introspection/standard`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StandardIntrospectionResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: StandardIntrospectionAction,
    pub response_content: Option<String>,
}
