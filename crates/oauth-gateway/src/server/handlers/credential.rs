//! Credential endpoints (OpenID4VCI).
//!
//! The backend parses the wallet's request and later issues whatever payload
//! we hand it in an order. Building that payload from the user's claims is the
//! only format-aware step here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use serde_json::{Map, Value, json};

use super::introspection::validate_access_token;
use crate::error::{HandlerError, HandlerResult};
use crate::models::{
    CredentialDeferredIssueRequest, CredentialDeferredParseRequest, CredentialIssuanceOrder,
    CredentialIssueAction, CredentialIssueResponse, CredentialParseAction, CredentialRequestInfo,
    CredentialSingleIssueRequest, CredentialSingleParseRequest,
};
use crate::server::AppState;
use crate::server::http;
use crate::server::router::paths;
use crate::users::User;

const JWT: &str = "application/jwt";

/// Namespace of ISO/IEC 18013-5 mobile driving licence elements.
const MDL_NAMESPACE: &str = "org.iso.18013.5.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Single,
    Deferred,
}

/// `POST /api/credential`
pub async fn handle_credential(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    process(&state, &headers, body, Flow::Single).await
}

/// `POST /api/deferred_credential`
pub async fn handle_deferred_credential(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    process(&state, &headers, body, Flow::Deferred).await
}

async fn process(
    state: &AppState,
    headers: &HeaderMap,
    body: String,
    flow: Flow,
) -> HandlerResult<Response> {
    let path = match flow {
        Flow::Single => paths::CREDENTIAL,
        Flow::Deferred => paths::DEFERRED_CREDENTIAL,
    };
    let validated = validate_access_token(state, headers, &Method::POST, path, None).await?;
    let dpop_nonce = validated.info.dpop_nonce.clone();

    let parsed = match flow {
        Flow::Single => {
            state
                .client
                .credential_single_parse(&CredentialSingleParseRequest {
                    access_token: validated.token.clone(),
                    request_content: body,
                })
                .await?
        }
        Flow::Deferred => {
            state
                .client
                .credential_deferred_parse(&CredentialDeferredParseRequest {
                    access_token: validated.token.clone(),
                    request_content: body,
                })
                .await?
        }
    };
    tracing::info!(action = ?parsed.action, ?flow, "Credential request parsed");

    let status = match parsed.action {
        CredentialParseAction::Ok => None,
        CredentialParseAction::BadRequest => Some(StatusCode::BAD_REQUEST),
        CredentialParseAction::Unauthorized => Some(StatusCode::UNAUTHORIZED),
        CredentialParseAction::Forbidden => Some(StatusCode::FORBIDDEN),
        CredentialParseAction::InternalServerError | CredentialParseAction::Unknown => {
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    if let Some(status) = status {
        return Ok(http::with_dpop_nonce(http::json(status, parsed.response_content), dpop_nonce));
    }

    let info = parsed
        .info
        .ok_or_else(|| HandlerError::internal("Parsed credential request carries no info"))?;

    let Some(subject) = validated.info.subject.as_deref() else {
        return Ok(http::oauth_error(
            StatusCode::FORBIDDEN,
            "invalid_token",
            "The access token is not bound to an end-user",
        ));
    };
    let Some(user) = state.users.lookup(subject).await else {
        tracing::warn!(%subject, "Credential subject not found in user directory");
        return Ok(http::oauth_error(
            StatusCode::FORBIDDEN,
            "invalid_token",
            "The end-user of the access token is unknown",
        ));
    };

    let payload = build_credential_payload(&info, &user)?;
    let order = CredentialIssuanceOrder {
        request_identifier: info.identifier.clone(),
        credential_payload: Some(payload.to_string()),
        ..CredentialIssuanceOrder::default()
    };

    let issued = match flow {
        Flow::Single => {
            state
                .client
                .credential_single_issue(&CredentialSingleIssueRequest {
                    access_token: validated.token,
                    order,
                })
                .await?
        }
        Flow::Deferred => {
            state.client.credential_deferred_issue(&CredentialDeferredIssueRequest { order }).await?
        }
    };

    Ok(http::with_dpop_nonce(issue_response(issued), dpop_nonce))
}

fn issue_response(res: CredentialIssueResponse) -> Response {
    tracing::info!(action = ?res.action, transaction_id = ?res.transaction_id, "Credential issued");

    match res.action {
        CredentialIssueAction::Ok => http::json(StatusCode::OK, res.response_content),
        CredentialIssueAction::OkJwt => http::jwt(StatusCode::OK, JWT, res.response_content),
        CredentialIssueAction::Accepted => http::json(StatusCode::ACCEPTED, res.response_content),
        CredentialIssueAction::AcceptedJwt => {
            http::jwt(StatusCode::ACCEPTED, JWT, res.response_content)
        }
        CredentialIssueAction::Unauthorized => {
            http::json(StatusCode::UNAUTHORIZED, res.response_content)
        }
        CredentialIssueAction::Forbidden => http::json(StatusCode::FORBIDDEN, res.response_content),
        CredentialIssueAction::CallerError
        | CredentialIssueAction::InternalServerError
        | CredentialIssueAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
    }
}

/// Claims of `user` that may go into a credential, optionally narrowed to
/// `requested` names. Localized variants (`name#ja`) are left out.
fn subject_claims(user: &User, requested: Option<&Map<String, Value>>) -> Map<String, Value> {
    user.claims
        .iter()
        .filter(|(name, _)| !name.contains('#'))
        .filter(|(name, _)| requested.is_none_or(|r| r.contains_key(name.as_str())))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Credential payload for the requested format.
///
/// | format | payload |
/// |---|---|
/// | `dc+sd-jwt`, `vc+sd-jwt` | `{vct, sub, ...claims}` |
/// | `jwt_vc_json` | `{sub, vc: {@context, type, credentialSubject}}` |
/// | `mso_mdoc` | `{doctype, claims: {namespace: {...}}}` |
pub fn build_credential_payload(info: &CredentialRequestInfo, user: &User) -> HandlerResult<Value> {
    let details = info.details_json();
    let format = info.format.as_deref().unwrap_or_default();

    match format {
        "dc+sd-jwt" | "vc+sd-jwt" => {
            let vct = details.get("vct").and_then(Value::as_str).ok_or_else(|| {
                HandlerError::bad_request("invalid_credential_request", "vct is missing")
            })?;

            let mut payload = subject_claims(user, details.get("claims").and_then(Value::as_object));
            payload.insert("vct".to_string(), json!(vct));
            payload.insert("sub".to_string(), json!(user.subject));
            Ok(Value::Object(payload))
        }
        "jwt_vc_json" => {
            let definition = details.get("credential_definition");
            let types = definition
                .and_then(|d| d.get("type"))
                .cloned()
                .unwrap_or_else(|| json!(["VerifiableCredential"]));
            let requested = definition
                .and_then(|d| d.get("credentialSubject"))
                .and_then(Value::as_object);

            let mut credential_subject = subject_claims(user, requested);
            credential_subject.insert("id".to_string(), json!(user.subject));

            Ok(json!({
                "sub": user.subject,
                "vc": {
                    "@context": ["https://www.w3.org/2018/credentials/v1"],
                    "type": types,
                    "credentialSubject": credential_subject
                }
            }))
        }
        "mso_mdoc" => {
            let doctype = details.get("doctype").and_then(Value::as_str).ok_or_else(|| {
                HandlerError::bad_request("invalid_credential_request", "doctype is missing")
            })?;
            let requested = details
                .get("claims")
                .and_then(|c| c.get(MDL_NAMESPACE))
                .and_then(Value::as_object);

            Ok(json!({
                "doctype": doctype,
                "claims": { MDL_NAMESPACE: subject_claims(user, requested) }
            }))
        }
        other => Err(HandlerError::bad_request(
            "unsupported_credential_format",
            format!("Credential format '{other}' is not supported"),
        )),
    }
}
