//! UserInfo endpoint (OpenID Connect Core §5.3).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;

use crate::decision;
use crate::error::HandlerResult;
use crate::models::{UserInfoAction, UserInfoIssueAction, UserInfoIssueRequest, UserInfoRequest};
use crate::server::AppState;
use crate::server::http;
use crate::server::router::paths;

const JWT: &str = "application/jwt";

/// `GET /api/userinfo`
pub async fn handle_userinfo_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HandlerResult<Response> {
    let token = http::access_token(&headers);
    process(&state, &headers, &Method::GET, token).await
}

/// `POST /api/userinfo`
///
/// The token may also arrive as the `access_token` form parameter.
pub async fn handle_userinfo_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    let token = http::access_token(&headers).or_else(|| http::form_parameter(&body, "access_token"));
    process(&state, &headers, &Method::POST, token).await
}

async fn process(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    token: Option<String>,
) -> HandlerResult<Response> {
    let dpop = http::dpop_context(headers, method, state.config.endpoint_url(paths::USERINFO));

    // Without a token the backend answers BAD_REQUEST with a ready-made challenge.
    let token = token.unwrap_or_default();
    let res = state
        .client
        .userinfo(&UserInfoRequest {
            token: token.clone(),
            client_certificate: http::client_certificate(headers, &state.config.client_cert_header),
            dpop: dpop.dpop.clone(),
            htm: Some(dpop.htm.clone()),
            htu: Some(dpop.htu.clone()),
        })
        .await?;
    tracing::info!(action = ?res.action, subject = ?res.subject, "UserInfo request");

    let status = match res.action {
        UserInfoAction::Ok => None,
        UserInfoAction::BadRequest => Some(StatusCode::BAD_REQUEST),
        UserInfoAction::Unauthorized => Some(StatusCode::UNAUTHORIZED),
        UserInfoAction::Forbidden => Some(StatusCode::FORBIDDEN),
        UserInfoAction::InternalServerError | UserInfoAction::Unknown => {
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    if let Some(status) = status {
        return Ok(http::with_dpop_nonce(
            http::challenge(status, res.response_content),
            res.dpop_nonce,
        ));
    }

    let claims = match res.subject.as_deref() {
        Some(subject) => match state.users.lookup(subject).await {
            Some(user) => decision::collect_claims(&user, &res.claims, &res.claims_locales),
            None => {
                tracing::warn!(%subject, "UserInfo subject not found in user directory");
                None
            }
        },
        None => None,
    };

    let issued = state
        .client
        .userinfo_issue(&UserInfoIssueRequest {
            token,
            claims,
            sub: None,
            dpop: dpop.dpop,
            htm: Some(dpop.htm),
            htu: Some(dpop.htu),
        })
        .await?;
    tracing::debug!(action = ?issued.action, "UserInfo issued");

    let response = match issued.action {
        UserInfoIssueAction::Json => http::json(StatusCode::OK, issued.response_content),
        UserInfoIssueAction::Jwt => http::jwt(StatusCode::OK, JWT, issued.response_content),
        UserInfoIssueAction::BadRequest => {
            http::challenge(StatusCode::BAD_REQUEST, issued.response_content)
        }
        UserInfoIssueAction::Unauthorized => {
            http::challenge(StatusCode::UNAUTHORIZED, issued.response_content)
        }
        UserInfoIssueAction::Forbidden => {
            http::challenge(StatusCode::FORBIDDEN, issued.response_content)
        }
        UserInfoIssueAction::InternalServerError | UserInfoIssueAction::Unknown => {
            http::challenge(StatusCode::INTERNAL_SERVER_ERROR, issued.response_content)
        }
    };

    Ok(http::with_dpop_nonce(response, issued.dpop_nonce.or(res.dpop_nonce)))
}
