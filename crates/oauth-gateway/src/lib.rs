//! OAuth Gateway
//!
//! HTTP endpoints for OAuth 2.0, OpenID Connect and OpenID4VCI in front of a
//! hosted authorization-server API. The backend performs all protocol work;
//! the gateway shapes requests, forwards them, and turns the backend's
//! `action` into the right HTTP response.
//!
//! # Features
//!
//! - **Authorization**: PAR, authorization with session-bound decisions,
//!   token (including the password grant), revocation, introspection, UserInfo
//! - **Discovery**: OpenID configuration, JWK set, credential issuer metadata
//! - **Credentials**: single and deferred credential issuance
//! - **Typed sessions**: batch get/set/delete over schema-typed fields
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use oauth_gateway::{config::Config, server::Gateway, users::InMemoryUserHandler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let users = Arc::new(InMemoryUserHandler::with_sample_users());
//!     Gateway::new(config, users)?.run_http(3000).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod decision;
pub mod error;
pub mod models;
pub mod server;
pub mod session;
pub mod users;

pub use client::ApiClient;
pub use config::Config;
pub use error::{ClientError, HandlerError, SessionError};
