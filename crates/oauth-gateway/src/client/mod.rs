//! Backend authorization-server API client.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - Bearer authentication with the service access token
//! - Response caching for the discovery documents
//!
//! Protocol outcomes arrive as HTTP 200 with an `action` field. A non-2xx
//! status means the call itself failed and is surfaced as a [`ClientError`].

use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    AuthorizationFailRequest, AuthorizationFailResponse, AuthorizationIssueRequest,
    AuthorizationIssueResponse, AuthorizationRequest, AuthorizationResponse,
    CredentialDeferredIssueRequest, CredentialDeferredParseRequest, CredentialIssueResponse,
    CredentialIssuerJwksRequest, CredentialIssuerMetadataRequest, CredentialMetadataResponse,
    CredentialParseResponse, CredentialSingleIssueRequest, CredentialSingleParseRequest,
    IntrospectionRequest, IntrospectionResponse, PushedAuthReqRequest, PushedAuthReqResponse,
    RevocationRequest, RevocationResponse, StandardIntrospectionRequest,
    StandardIntrospectionResponse, TokenFailRequest, TokenFailResponse, TokenIssueRequest,
    TokenIssueResponse, TokenRequest, TokenResponse, UserInfoIssueRequest,
    UserInfoIssueResponse, UserInfoRequest, UserInfoResponse,
};

/// Backend API client.
#[derive(Clone)]
pub struct ApiClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Discovery document cache.
    cache: Cache<String, serde_json::Value>,

    /// Service-scoped API base URL (`{base}/api/{serviceId}`).
    service_api_url: String,

    /// Whether a service access token is configured.
    has_token: bool,
}

impl ApiClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref token) = config.service_access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            client,
            cache,
            service_api_url: config.service_api_url(),
            has_token: config.has_service_token(),
        })
    }

    /// Check if a service access token is configured.
    #[must_use]
    pub fn has_service_token(&self) -> bool {
        self.has_token
    }

    /// Process a pushed authorization request.
    pub async fn pushed_auth_req(
        &self,
        request: &PushedAuthReqRequest,
    ) -> ClientResult<PushedAuthReqResponse> {
        self.post("/pushed_auth_req", request).await
    }

    /// Process an authorization request.
    pub async fn authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> ClientResult<AuthorizationResponse> {
        self.post("/auth/authorization", request).await
    }

    /// Issue the authorization response for a ticket.
    pub async fn authorization_issue(
        &self,
        request: &AuthorizationIssueRequest,
    ) -> ClientResult<AuthorizationIssueResponse> {
        self.post("/auth/authorization/issue", request).await
    }

    /// Reject the authorization request behind a ticket.
    pub async fn authorization_fail(
        &self,
        request: &AuthorizationFailRequest,
    ) -> ClientResult<AuthorizationFailResponse> {
        self.post("/auth/authorization/fail", request).await
    }

    /// Process a token request.
    pub async fn token(&self, request: &TokenRequest) -> ClientResult<TokenResponse> {
        self.post("/auth/token", request).await
    }

    /// Issue tokens for a password grant ticket.
    pub async fn token_issue(&self, request: &TokenIssueRequest) -> ClientResult<TokenIssueResponse> {
        self.post("/auth/token/issue", request).await
    }

    /// Reject a password grant ticket.
    pub async fn token_fail(&self, request: &TokenFailRequest) -> ClientResult<TokenFailResponse> {
        self.post("/auth/token/fail", request).await
    }

    /// Validate an access token presented to a protected resource.
    pub async fn introspection(
        &self,
        request: &IntrospectionRequest,
    ) -> ClientResult<IntrospectionResponse> {
        self.post("/auth/introspection", request).await
    }

    /// Process an RFC 7662 introspection request.
    pub async fn standard_introspection(
        &self,
        request: &StandardIntrospectionRequest,
    ) -> ClientResult<StandardIntrospectionResponse> {
        self.post("/auth/introspection/standard", request).await
    }

    /// Process an RFC 7009 revocation request.
    pub async fn revocation(&self, request: &RevocationRequest) -> ClientResult<RevocationResponse> {
        self.post("/auth/revocation", request).await
    }

    /// Process a UserInfo request.
    pub async fn userinfo(&self, request: &UserInfoRequest) -> ClientResult<UserInfoResponse> {
        self.post("/auth/userinfo", request).await
    }

    /// Issue the UserInfo response.
    pub async fn userinfo_issue(
        &self,
        request: &UserInfoIssueRequest,
    ) -> ClientResult<UserInfoIssueResponse> {
        self.post("/auth/userinfo/issue", request).await
    }

    /// OpenID Provider / authorization server metadata.
    pub async fn service_configuration(&self) -> ClientResult<serde_json::Value> {
        let params = vec![("pretty".to_string(), "false".to_string())];
        self.get("/service/configuration", &params).await
    }

    /// Public JWK set of the service.
    pub async fn service_jwks(&self) -> ClientResult<serde_json::Value> {
        let params = vec![
            ("includePrivateKeys".to_string(), "false".to_string()),
            ("pretty".to_string(), "false".to_string()),
        ];
        self.get("/service/jwks/get", &params).await
    }

    /// Credential issuer metadata.
    pub async fn credential_issuer_metadata(
        &self,
        request: &CredentialIssuerMetadataRequest,
    ) -> ClientResult<CredentialMetadataResponse> {
        self.post("/vci/metadata", request).await
    }

    /// Credential issuer JWK set.
    pub async fn credential_issuer_jwks(
        &self,
        request: &CredentialIssuerJwksRequest,
    ) -> ClientResult<CredentialMetadataResponse> {
        self.post("/vci/jwks", request).await
    }

    /// Parse a credential request.
    pub async fn credential_single_parse(
        &self,
        request: &CredentialSingleParseRequest,
    ) -> ClientResult<CredentialParseResponse> {
        self.post("/vci/single/parse", request).await
    }

    /// Issue a credential order.
    pub async fn credential_single_issue(
        &self,
        request: &CredentialSingleIssueRequest,
    ) -> ClientResult<CredentialIssueResponse> {
        self.post("/vci/single/issue", request).await
    }

    /// Parse a deferred credential request.
    pub async fn credential_deferred_parse(
        &self,
        request: &CredentialDeferredParseRequest,
    ) -> ClientResult<CredentialParseResponse> {
        self.post("/vci/deferred/parse", request).await
    }

    /// Issue a deferred credential order.
    pub async fn credential_deferred_issue(
        &self,
        request: &CredentialDeferredIssueRequest,
    ) -> ClientResult<CredentialIssueResponse> {
        self.post("/vci/deferred/issue", request).await
    }

    /// Make a cached GET request.
    async fn get<T>(&self, path: &str, params: &[(String, String)]) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.service_api_url, path);

        let cache_key = self.cache_key("GET", &url, params);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!(path, "Serving cached backend response");
            return serde_json::from_value(cached).map_err(ClientError::from);
        }

        let response = self.client.get(&url).query(params).send().await?;

        let response = self.handle_response(response).await?;
        let value: serde_json::Value = response.json().await?;

        self.cache.insert(cache_key, value.clone()).await;

        serde_json::from_value(value).map_err(ClientError::from)
    }

    /// Make a POST request with a JSON body.
    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.service_api_url, path);
        let body_str = serde_json::to_string(body)?;

        tracing::debug!(path, "Calling backend API");

        let response = self.client.post(&url).body(body_str).send().await?;

        let response = self.handle_response(response).await?;
        let value: serde_json::Value = response.json().await?;

        if let Some(code) = value.get("resultCode").and_then(|c| c.as_str()) {
            tracing::debug!(path, result_code = code, "Backend API answered");
        }

        serde_json::from_value(value).map_err(ClientError::from)
    }

    /// Handle API response status codes.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);

                Err(ClientError::rate_limited(retry_after))
            }
            401 | 403 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::Unauthorized { status: status.as_u16(), message: text })
            }
            404 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::not_found(text))
            }
            400 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::bad_request(text))
            }
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    /// Generate cache key.
    fn cache_key(&self, method: &str, url: &str, params: &[(String, String)]) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(method.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("service_api_url", &self.service_api_url)
            .field("has_service_token", &self.has_token)
            .finish()
    }
}
