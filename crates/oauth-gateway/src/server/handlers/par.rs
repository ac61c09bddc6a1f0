//! Pushed authorization request endpoint (RFC 9126).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;

use crate::error::HandlerResult;
use crate::models::{PushedAuthReqAction, PushedAuthReqRequest};
use crate::server::AppState;
use crate::server::http;
use crate::server::router::paths;

/// `POST /api/par`
pub async fn handle_par(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    let credentials = http::client_credentials(&headers, &state.config.client_cert_header);
    let dpop = http::dpop_context(&headers, &Method::POST, state.config.endpoint_url(paths::PAR));

    let res = state
        .client
        .pushed_auth_req(&PushedAuthReqRequest::new(body, credentials, dpop))
        .await?;

    tracing::info!(action = ?res.action, request_uri = ?res.request_uri, "Pushed authorization request");

    let status = match res.action {
        PushedAuthReqAction::Created => StatusCode::CREATED,
        PushedAuthReqAction::BadRequest => StatusCode::BAD_REQUEST,
        PushedAuthReqAction::Unauthorized => StatusCode::UNAUTHORIZED,
        PushedAuthReqAction::Forbidden => StatusCode::FORBIDDEN,
        PushedAuthReqAction::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        PushedAuthReqAction::InternalServerError | PushedAuthReqAction::Unknown => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    Ok(http::with_dpop_nonce(http::json(status, res.response_content), res.dpop_nonce))
}
