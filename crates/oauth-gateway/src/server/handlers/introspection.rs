//! Token introspection.
//!
//! Two flavours: the RFC 7662 endpoint offered to resource servers, and
//! [`validate_access_token`], which protects this gateway's own bearer
//! endpoints (UserInfo, credential issuance).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::Response;

use crate::error::{HandlerError, HandlerResult};
use crate::models::{
    IntrospectionAction, IntrospectionRequest, IntrospectionResponse,
    StandardIntrospectionAction, StandardIntrospectionRequest,
};
use crate::server::AppState;
use crate::server::http;

const INTROSPECTION_JWT: &str = "application/token-introspection+jwt";

const MISSING_TOKEN_CHALLENGE: &str =
    "Bearer error=\"invalid_token\",error_description=\"An access token must be sent\"";

/// `POST /api/introspection`
///
/// Only resource servers listed in the configuration may call it.
pub async fn handle_introspection(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    let authenticated = http::basic_credentials(&headers).is_some_and(|(id, secret)| {
        state.config.resource_servers.iter().any(|(rs_id, rs_secret)| {
            *rs_id == id && *rs_secret == secret
        })
    });
    if !authenticated {
        tracing::info!("Introspection caller failed authentication");
        return Ok(http::invalid_client(
            Some(
                serde_json::json!({
                    "error": "invalid_client",
                    "error_description": "Resource server authentication failed"
                })
                .to_string(),
            ),
            "introspection",
        ));
    }

    let request = StandardIntrospectionRequest {
        parameters: body,
        http_accept_header: headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        with_hidden_properties: false,
    };
    let res = state.client.standard_introspection(&request).await?;
    tracing::info!(action = ?res.action, "Introspection request");

    Ok(match res.action {
        StandardIntrospectionAction::Ok => http::json(StatusCode::OK, res.response_content),
        StandardIntrospectionAction::Jwt => {
            http::jwt(StatusCode::OK, INTROSPECTION_JWT, res.response_content)
        }
        StandardIntrospectionAction::BadRequest => {
            http::json(StatusCode::BAD_REQUEST, res.response_content)
        }
        StandardIntrospectionAction::InternalServerError | StandardIntrospectionAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
    })
}

/// Validated access token with its introspection result.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub token: String,
    pub info: IntrospectionResponse,
}

/// Check the access token presented to one of the gateway's own endpoints.
///
/// Rejections become [`HandlerError::TokenRejected`] carrying the backend's
/// `WWW-Authenticate` challenge.
pub async fn validate_access_token(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    path: &str,
    scopes: Option<Vec<String>>,
) -> HandlerResult<ValidatedToken> {
    let Some(token) = http::access_token(headers) else {
        return Err(HandlerError::TokenRejected {
            status: StatusCode::UNAUTHORIZED,
            challenge: Some(MISSING_TOKEN_CHALLENGE.to_string()),
            dpop_nonce: None,
        });
    };

    let dpop = http::dpop_context(headers, method, state.config.endpoint_url(path));
    let request = IntrospectionRequest {
        token: token.clone(),
        scopes,
        client_certificate: http::client_certificate(headers, &state.config.client_cert_header),
        dpop: dpop.dpop,
        htm: Some(dpop.htm),
        htu: Some(dpop.htu),
        ..IntrospectionRequest::default()
    };

    let info = state.client.introspection(&request).await?;
    tracing::debug!(action = ?info.action, subject = ?info.subject, "Access token introspected");

    let status = match info.action {
        IntrospectionAction::Ok => return Ok(ValidatedToken { token, info }),
        IntrospectionAction::BadRequest => StatusCode::BAD_REQUEST,
        IntrospectionAction::Unauthorized => StatusCode::UNAUTHORIZED,
        IntrospectionAction::Forbidden => StatusCode::FORBIDDEN,
        IntrospectionAction::InternalServerError | IntrospectionAction::Unknown => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    Err(HandlerError::TokenRejected {
        status,
        challenge: info.response_content,
        dpop_nonce: info.dpop_nonce,
    })
}
