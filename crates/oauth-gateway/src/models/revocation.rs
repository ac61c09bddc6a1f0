//! Token revocation models (`/auth/revocation`).

use serde::{Deserialize, Serialize};

use super::ClientCredentials;

/// Request body for `/auth/revocation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRequest {
    pub parameters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
}

impl RevocationRequest {
    #[must_use]
    pub fn new(parameters: String, credentials: ClientCredentials) -> Self {
        Self {
            parameters,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            client_certificate: credentials.client_certificate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevocationAction {
    InvalidClient,
    InternalServerError,
    BadRequest,
    Ok,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/revocation`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevocationResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: RevocationAction,
    pub response_content: Option<String>,
}
