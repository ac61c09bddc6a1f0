//! Pushed authorization request models (`/pushed_auth_req`).

use serde::{Deserialize, Serialize};

use super::{ClientCredentials, DpopContext};

/// Request body for `/pushed_auth_req`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushedAuthReqRequest {
    /// Form-encoded body of the incoming PAR request.
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

impl PushedAuthReqRequest {
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

/// Result of a pushed authorization request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushedAuthReqAction {
    Created,
    BadRequest,
    Unauthorized,
    Forbidden,
    PayloadTooLarge,
    InternalServerError,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/pushed_auth_req`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushedAuthReqResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: PushedAuthReqAction,
    pub response_content: Option<String>,
    pub request_uri: Option<String>,
    pub client_auth_method: Option<String>,
    pub dpop_nonce: Option<String>,
}
