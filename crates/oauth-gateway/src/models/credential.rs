//! OpenID4VCI models (`/vci/...`).
//!
//! Issuance is a two step exchange: the wallet's request body is *parsed* by
//! the backend, then an *order* carrying the credential payload is issued.

use serde::{Deserialize, Serialize};

/// Request body for `/vci/metadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialIssuerMetadataRequest {
    pub pretty: bool,
}

/// Request body for `/vci/jwks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialIssuerJwksRequest {
    pub pretty: bool,
}

/// Result of the metadata and JWKS calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialMetadataAction {
    Ok,
    NotFound,
    InternalServerError,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/vci/metadata` and `/vci/jwks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialMetadataResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: CredentialMetadataAction,
    pub response_content: Option<String>,
}

/// Request body for `/vci/single/parse`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSingleParseRequest {
    pub access_token: String,
    /// Raw JSON body sent by the wallet.
    pub request_content: String,
}

/// Request body for `/vci/deferred/parse`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDeferredParseRequest {
    pub access_token: String,
    pub request_content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialParseAction {
    Ok,
    BadRequest,
    Unauthorized,
    Forbidden,
    InternalServerError,
    #[default]
    #[serde(other)]
    Unknown,
}

/// What the wallet asked for, as understood by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialRequestInfo {
    /// Identifier to quote back in the issuance order.
    pub identifier: String,
    /// Credential format, e.g. `dc+sd-jwt`, `jwt_vc_json`, `mso_mdoc`.
    pub format: Option<String>,
    pub binding_key: Option<String>,
    pub binding_keys: Vec<String>,
    /// JSON object with format-specific request details, as a string.
    pub details: Option<String>,
}

/// Response of the parse calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialParseResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: CredentialParseAction,
    pub response_content: Option<String>,
    pub info: Option<CredentialRequestInfo>,
}

/// Instruction to the backend on what to issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialIssuanceOrder {
    pub request_identifier: String,
    /// JSON object with the credential claims, as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_payload: Option<String>,
    pub issuance_deferred: bool,
    /// Credential lifetime in seconds; `0` uses the service default.
    pub credential_duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_key_id: Option<String>,
}

/// Request body for `/vci/single/issue`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSingleIssueRequest {
    pub access_token: String,
    pub order: CredentialIssuanceOrder,
}

/// Request body for `/vci/deferred/issue`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDeferredIssueRequest {
    pub order: CredentialIssuanceOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialIssueAction {
    CallerError,
    Unauthorized,
    Forbidden,
    Ok,
    OkJwt,
    Accepted,
    AcceptedJwt,
    InternalServerError,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of the issue calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialIssueResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: CredentialIssueAction,
    pub response_content: Option<String>,
    pub transaction_id: Option<String>,
}

impl CredentialRequestInfo {
    /// Parsed `details` object, or an empty object.
    #[must_use]
    pub fn details_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.details
            .as_deref()
            .and_then(|d| serde_json::from_str(d).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_info() {
        let res: CredentialParseResponse = serde_json::from_value(serde_json::json!({
            "action": "OK",
            "info": {
                "identifier": "req-1",
                "format": "dc+sd-jwt",
                "details": "{\"vct\":\"urn:eudi:pid:1\"}"
            }
        }))
        .unwrap();

        let info = res.info.unwrap();
        assert_eq!(res.action, CredentialParseAction::Ok);
        assert_eq!(info.details_json()["vct"], "urn:eudi:pid:1");
    }

    #[test]
    fn test_issue_action_variants() {
        for (wire, expected) in [
            ("OK_JWT", CredentialIssueAction::OkJwt),
            ("ACCEPTED_JWT", CredentialIssueAction::AcceptedJwt),
            ("CALLER_ERROR", CredentialIssueAction::CallerError),
        ] {
            let action: CredentialIssueAction =
                serde_json::from_value(serde_json::json!(wire)).unwrap();
            assert_eq!(action, expected);
        }
    }

    #[test]
    fn test_order_serialization() {
        let req = CredentialSingleIssueRequest {
            access_token: "at".into(),
            order: CredentialIssuanceOrder {
                request_identifier: "req-1".into(),
                credential_payload: Some("{}".into()),
                ..CredentialIssuanceOrder::default()
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["accessToken"], "at");
        assert_eq!(json["order"]["requestIdentifier"], "req-1");
        assert_eq!(json["order"]["issuanceDeferred"], false);
        assert!(json["order"].get("signingKeyId").is_none());
    }
}
