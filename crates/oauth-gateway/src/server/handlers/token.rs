//! Token endpoint (RFC 6749 §3.2).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;

use crate::error::{HandlerError, HandlerResult};
use crate::models::{
    TokenAction, TokenFailAction, TokenFailReason, TokenFailRequest, TokenIssueAction,
    TokenIssueRequest, TokenRequest, TokenResponse,
};
use crate::server::AppState;
use crate::server::http;
use crate::server::router::paths;

/// `POST /api/token`
pub async fn handle_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    let credentials = http::client_credentials(&headers, &state.config.client_cert_header);
    let dpop =
        http::dpop_context(&headers, &Method::POST, state.config.endpoint_url(paths::TOKEN));

    let res = state.client.token(&TokenRequest::new(body, credentials, dpop)).await?;
    tracing::info!(action = ?res.action, grant_type = ?res.grant_type, client_id = ?res.client_id, "Token request");

    let dpop_nonce = res.dpop_nonce.clone();
    let response = match res.action {
        TokenAction::InvalidClient => http::invalid_client(res.response_content, "token"),
        TokenAction::InternalServerError | TokenAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
        TokenAction::BadRequest => http::json(StatusCode::BAD_REQUEST, res.response_content),
        TokenAction::Ok | TokenAction::IdTokenReissuable => {
            http::json(StatusCode::OK, res.response_content)
        }
        TokenAction::Password => password_grant(&state, res).await?,
        TokenAction::TokenExchange | TokenAction::JwtBearer => http::oauth_error(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            "This authorization server does not support the grant type",
        ),
    };

    Ok(http::with_dpop_nonce(response, dpop_nonce))
}

/// Resource owner password credentials grant.
async fn password_grant(state: &AppState, res: TokenResponse) -> HandlerResult<Response> {
    let ticket = res
        .ticket
        .ok_or_else(|| HandlerError::internal("Backend response carries no ticket"))?;
    let username = res.username.unwrap_or_default();
    let password = res.password.unwrap_or_default();

    let Some(user) = state.users.authenticate(&username, &password).await else {
        tracing::info!(%username, "Resource owner authentication failed");
        let res = state
            .client
            .token_fail(&TokenFailRequest {
                ticket,
                reason: TokenFailReason::InvalidResourceOwnerCredentials,
            })
            .await?;

        return Ok(match res.action {
            TokenFailAction::BadRequest => {
                http::json(StatusCode::BAD_REQUEST, res.response_content)
            }
            TokenFailAction::InternalServerError | TokenFailAction::Unknown => {
                http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
            }
        });
    };

    let res = state
        .client
        .token_issue(&TokenIssueRequest { ticket, subject: user.subject.clone() })
        .await?;
    tracing::info!(action = ?res.action, subject = %user.subject, "Token issued for resource owner");

    Ok(match res.action {
        TokenIssueAction::Ok => http::json(StatusCode::OK, res.response_content),
        TokenIssueAction::InternalServerError | TokenIssueAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
    })
}
