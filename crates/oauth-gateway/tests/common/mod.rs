//! Shared fixtures: a router wired to a wiremock backend.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth_gateway::client::ApiClient;
use oauth_gateway::config::Config;
use oauth_gateway::server::{AppState, create_router};
use oauth_gateway::session::{MemorySessionStore, SessionStore};
use oauth_gateway::users::InMemoryUserHandler;

pub struct TestApp {
    pub router: Router,
    pub backend: MockServer,
    pub sessions: Arc<dyn SessionStore>,
}

impl TestApp {
    pub async fn start() -> Self {
        let backend = MockServer::start().await;
        let config = Config::for_testing(&backend.uri());
        let client = ApiClient::new(&config).unwrap();
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::default());
        let users = Arc::new(InMemoryUserHandler::with_sample_users());

        let state = Arc::new(AppState::new(config, client, Arc::clone(&sessions), users));
        Self { router: create_router(state), backend, sessions }
    }

    /// Answer `POST /api/1234{api_path}` with `body`.
    pub async fn mock_post(&self, api_path: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(backend_path(api_path)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    /// Answer `GET /api/1234{api_path}` with `body`.
    pub async fn mock_get(&self, api_path: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(backend_path(api_path)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    /// Answer `POST /api/1234{api_path}` with a bare HTTP status.
    pub async fn mock_status(&self, api_path: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(backend_path(api_path)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.backend)
            .await;
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// JSON bodies the backend received on `api_path`.
    pub async fn received(&self, api_path: &str) -> Vec<Value> {
        let full = backend_path(api_path);
        self.backend
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == full)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

pub fn backend_path(api_path: &str) -> String {
    format!("/api/1234{api_path}")
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn basic(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// `name=value` of the session cookie set on a response.
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("gateway_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn header_value<B>(response: &Response<B>, name: &str) -> Option<String> {
    response.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}
