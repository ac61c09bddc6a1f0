//! Token revocation endpoint (RFC 7009).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

use crate::error::HandlerResult;
use crate::models::{RevocationAction, RevocationRequest};
use crate::server::AppState;
use crate::server::http;

const JAVASCRIPT: &str = "application/javascript;charset=UTF-8";

/// `POST /api/revocation`
pub async fn handle_revocation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<Response> {
    let credentials = http::client_credentials(&headers, &state.config.client_cert_header);
    let res = state.client.revocation(&RevocationRequest::new(body, credentials)).await?;
    tracing::info!(action = ?res.action, "Revocation request");

    Ok(match res.action {
        RevocationAction::InvalidClient => http::invalid_client(res.response_content, "revocation"),
        RevocationAction::BadRequest => http::json(StatusCode::BAD_REQUEST, res.response_content),
        RevocationAction::Ok => http::no_store(StatusCode::OK, JAVASCRIPT, res.response_content),
        RevocationAction::InternalServerError | RevocationAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
    })
}
