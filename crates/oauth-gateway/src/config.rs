//! Configuration for the gateway.
//!
//! Settings come from environment variables (optionally via a `.env` file) and
//! can be overridden on the command line.

use std::path::PathBuf;
use std::time::Duration;

/// Backend API constants.
pub mod api {
    use std::time::Duration;

    /// Default backend API base URL.
    pub const BASE_URL: &str = "https://us.authlete.com";

    /// Default public base URL of this gateway.
    pub const PUBLIC_BASE_URL: &str = "http://localhost:3000";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Keep-alive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

    /// Maximum keep-alive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Retries for transient transport failures.
    pub const MAX_RETRIES: u32 = 3;

    /// Discovery document cache TTL.
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cached discovery documents.
    pub const CACHE_MAX_SIZE: u64 = 64;
}

/// Session constants.
pub mod session {
    use std::time::Duration;

    /// Idle time after which a session is dropped.
    pub const TTL: Duration = Duration::from_secs(1800);

    /// Name of the session cookie.
    pub const COOKIE_NAME: &str = "gateway_session";

    /// Upper bound on live sessions held in memory.
    pub const MAX_SESSIONS: u64 = 100_000;
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API base URL (without the `/api/{serviceId}` suffix).
    pub api_base_url: String,

    /// Backend service identifier.
    pub service_id: String,

    /// Service access token used as bearer credential against the backend.
    pub service_access_token: Option<String>,

    /// Public base URL of this gateway, used to build DPoP `htu` values.
    pub public_base_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Retries for transient backend failures.
    pub max_retries: u32,

    /// Discovery document cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cached discovery documents.
    pub cache_max_size: u64,

    /// Session idle timeout.
    pub session_ttl: Duration,

    /// Session cookie name.
    pub session_cookie_name: String,

    /// Salt mixed into pairwise subject identifiers.
    pub pairwise_salt: String,

    /// Header carrying the PEM client certificate forwarded by a TLS terminator.
    pub client_cert_header: String,

    /// Optional JSON file with user records.
    pub users_file: Option<PathBuf>,

    /// `(id, secret)` pairs resource servers use on the introspection endpoint.
    pub resource_servers: Vec<(String, String)>,
}

impl Config {
    /// Create a configuration for the given backend service.
    #[must_use]
    pub fn new(service_id: impl Into<String>, service_access_token: Option<String>) -> Self {
        Self {
            api_base_url: api::BASE_URL.to_string(),
            service_id: service_id.into(),
            service_access_token,
            public_base_url: api::PUBLIC_BASE_URL.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            max_retries: api::MAX_RETRIES,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            session_ttl: session::TTL,
            session_cookie_name: session::COOKIE_NAME.to_string(),
            pairwise_salt: String::new(),
            client_cert_header: "x-ssl-cert".to_string(),
            users_file: None,
            resource_servers: Vec::new(),
        }
    }

    /// Create a test configuration pointing at a mock backend.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            service_id: "1234".to_string(),
            service_access_token: Some("test-service-token".to_string()),
            public_base_url: "https://as.example.com".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            max_retries: 0, // Mock 5xx responses must not be retried
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
            session_ttl: Duration::from_secs(60),
            session_cookie_name: session::COOKIE_NAME.to_string(),
            pairwise_salt: "test-salt".to_string(),
            client_cert_header: "x-ssl-cert".to_string(),
            users_file: None,
            resource_servers: vec![("rs".to_string(), "rs-secret".to_string())],
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `.env` if present. Recognised variables:
    /// `API_BASE_URL`, `API_SERVICE_ID`, `API_SERVICE_ACCESS_TOKEN`,
    /// `PUBLIC_BASE_URL`, `PAIRWISE_SALT`, `CLIENT_CERT_HEADER`, `USERS_FILE`,
    /// `SESSION_TTL_SECS`, `INTROSPECTION_CREDENTIALS` (`id:secret,id:secret`).
    ///
    /// # Errors
    ///
    /// Returns error if the service id is missing or a numeric value is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let service_id = std::env::var("API_SERVICE_ID")
            .map_err(|_| anyhow::anyhow!("API_SERVICE_ID must be set"))?;
        let token = std::env::var("API_SERVICE_ACCESS_TOKEN").ok();

        let mut config = Self::new(service_id, token);

        if let Ok(url) = std::env::var("API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(salt) = std::env::var("PAIRWISE_SALT") {
            config.pairwise_salt = salt;
        }
        if let Ok(header) = std::env::var("CLIENT_CERT_HEADER") {
            config.client_cert_header = header.to_ascii_lowercase();
        }
        if let Ok(path) = std::env::var("USERS_FILE") {
            config.users_file = Some(PathBuf::from(path));
        }
        if let Ok(secs) = std::env::var("SESSION_TTL_SECS") {
            config.session_ttl = Duration::from_secs(secs.parse()?);
        }
        if let Ok(pairs) = std::env::var("INTROSPECTION_CREDENTIALS") {
            config.resource_servers = parse_credential_pairs(&pairs)?;
        }

        Ok(config)
    }

    /// Base URL of the service-scoped backend API.
    #[must_use]
    pub fn service_api_url(&self) -> String {
        format!("{}/api/{}", self.api_base_url, self.service_id)
    }

    /// Absolute URL of a gateway endpoint, as used for DPoP `htu`.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), path)
    }

    /// Check if a service access token is configured.
    #[must_use]
    pub const fn has_service_token(&self) -> bool {
        self.service_access_token.is_some()
    }
}

/// Parse `id:secret,id:secret`.
fn parse_credential_pairs(value: &str) -> anyhow::Result<Vec<(String, String)>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once(':')
                .map(|(id, secret)| (id.to_string(), secret.to_string()))
                .ok_or_else(|| anyhow::anyhow!("credential pair '{pair}' must be id:secret"))
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self::new("", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.service_access_token.is_none());
        assert!(!config.has_service_token());
        assert_eq!(config.max_retries, api::MAX_RETRIES);
    }

    #[test]
    fn test_service_api_url() {
        let config = Config::for_testing("http://127.0.0.1:9999/");
        assert_eq!(config.service_api_url(), "http://127.0.0.1:9999/api/1234");
    }

    #[test]
    fn test_parse_credential_pairs() {
        let pairs = parse_credential_pairs("rs1:s1, rs2:s:2,").unwrap();
        assert_eq!(
            pairs,
            vec![("rs1".to_string(), "s1".to_string()), ("rs2".to_string(), "s:2".to_string())]
        );
        assert!(parse_credential_pairs("broken").is_err());
    }

    #[test]
    fn test_endpoint_url() {
        let mut config = Config::default();
        config.public_base_url = "https://as.example.com/".to_string();
        assert_eq!(config.endpoint_url("/api/par"), "https://as.example.com/api/par");
    }
}
