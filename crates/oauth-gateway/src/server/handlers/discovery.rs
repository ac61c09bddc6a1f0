//! Discovery documents and key sets.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::error::HandlerResult;
use crate::models::{
    CredentialIssuerJwksRequest, CredentialIssuerMetadataRequest, CredentialMetadataAction,
    CredentialMetadataResponse,
};
use crate::server::AppState;
use crate::server::http;

/// `GET /.well-known/openid-configuration`, `GET /.well-known/oauth-authorization-server`
pub async fn handle_configuration(State(state): State<Arc<AppState>>) -> HandlerResult<Response> {
    let document = state.client.service_configuration().await?;
    Ok(http::json(StatusCode::OK, Some(document.to_string())))
}

/// `GET /api/jwks`
pub async fn handle_jwks(State(state): State<Arc<AppState>>) -> HandlerResult<Response> {
    let jwks = state.client.service_jwks().await?;
    Ok(http::json(StatusCode::OK, Some(jwks.to_string())))
}

/// `GET /.well-known/openid-credential-issuer`
pub async fn handle_credential_issuer_metadata(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Response> {
    let res = state
        .client
        .credential_issuer_metadata(&CredentialIssuerMetadataRequest { pretty: false })
        .await?;
    Ok(metadata_response(res))
}

/// `GET /api/vci/jwks`
pub async fn handle_credential_issuer_jwks(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Response> {
    let res = state
        .client
        .credential_issuer_jwks(&CredentialIssuerJwksRequest { pretty: false })
        .await?;
    Ok(metadata_response(res))
}

fn metadata_response(res: CredentialMetadataResponse) -> Response {
    tracing::debug!(action = ?res.action, "Credential issuer document");

    let status = match res.action {
        CredentialMetadataAction::Ok => StatusCode::OK,
        CredentialMetadataAction::NotFound => StatusCode::NOT_FOUND,
        CredentialMetadataAction::InternalServerError | CredentialMetadataAction::Unknown => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    http::json(status, res.response_content)
}
