//! Route table.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers::{
    authorization, credential, discovery, introspection, par, revocation, token, userinfo,
};

/// Endpoint paths, also used to build DPoP `htu` values.
pub mod paths {
    pub const PAR: &str = "/api/par";
    pub const AUTHORIZATION: &str = "/api/authorization";
    pub const AUTHORIZATION_DECISION: &str = "/api/authorization/decision";
    pub const TOKEN: &str = "/api/token";
    pub const INTROSPECTION: &str = "/api/introspection";
    pub const REVOCATION: &str = "/api/revocation";
    pub const USERINFO: &str = "/api/userinfo";
    pub const JWKS: &str = "/api/jwks";
    pub const OPENID_CONFIGURATION: &str = "/.well-known/openid-configuration";
    pub const OAUTH_SERVER_METADATA: &str = "/.well-known/oauth-authorization-server";
    pub const CREDENTIAL_ISSUER: &str = "/.well-known/openid-credential-issuer";
    pub const CREDENTIAL_ISSUER_JWKS: &str = "/api/vci/jwks";
    pub const CREDENTIAL: &str = "/api/credential";
    pub const DEFERRED_CREDENTIAL: &str = "/api/deferred_credential";
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route(paths::PAR, post(par::handle_par))
        .route(
            paths::AUTHORIZATION,
            get(authorization::handle_authorization_get)
                .post(authorization::handle_authorization_post),
        )
        .route(paths::AUTHORIZATION_DECISION, post(authorization::handle_decision))
        .route(paths::TOKEN, post(token::handle_token))
        .route(paths::INTROSPECTION, post(introspection::handle_introspection))
        .route(paths::REVOCATION, post(revocation::handle_revocation))
        .route(
            paths::USERINFO,
            get(userinfo::handle_userinfo_get).post(userinfo::handle_userinfo_post),
        )
        .route(paths::OPENID_CONFIGURATION, get(discovery::handle_configuration))
        .route(paths::OAUTH_SERVER_METADATA, get(discovery::handle_configuration))
        .route(paths::JWKS, get(discovery::handle_jwks))
        .route(paths::CREDENTIAL_ISSUER, get(discovery::handle_credential_issuer_metadata))
        .route(paths::CREDENTIAL_ISSUER_JWKS, get(discovery::handle_credential_issuer_jwks))
        .route(paths::CREDENTIAL, post(credential::handle_credential))
        .route(paths::DEFERRED_CREDENTIAL, post(credential::handle_deferred_credential))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "oauth-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "service": "oauth-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.session_count(),
        "service_token": state.client.has_service_token()
    }))
}
