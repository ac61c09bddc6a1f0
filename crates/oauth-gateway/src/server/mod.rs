//! HTTP server for the gateway endpoints.
//!
//! [`Gateway`] wires the backend client, the session store and the user
//! directory into an [`AppState`] shared by every handler.

pub mod handlers;
pub mod http;
pub mod router;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

pub use router::create_router;

use crate::client::ApiClient;
use crate::config::Config;
use crate::session::{MemorySessionStore, SessionStore};
use crate::users::UserHandler;

/// State shared by all handlers.
pub struct AppState {
    /// Backend API client.
    pub client: ApiClient,

    /// Raw session storage.
    pub sessions: Arc<dyn SessionStore>,

    /// End-user directory.
    pub users: Arc<dyn UserHandler>,

    /// Gateway configuration.
    pub config: Config,
}

impl AppState {
    /// Bundle the collaborators.
    #[must_use]
    pub fn new(
        config: Config,
        client: ApiClient,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserHandler>,
    ) -> Self {
        Self { client, sessions, users, config }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("client", &self.client)
            .field("sessions", &self.sessions.session_count())
            .finish()
    }
}

/// The gateway server.
pub struct Gateway {
    state: Arc<AppState>,
}

impl Gateway {
    /// Create a gateway with an in-memory session store.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: Config, users: Arc<dyn UserHandler>) -> anyhow::Result<Self> {
        let client = ApiClient::new(&config)?;
        let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));

        Ok(Self { state: Arc::new(AppState::new(config, client, sessions, users)) })
    }

    /// Create a gateway around prepared state.
    #[must_use]
    pub const fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Router serving every endpoint.
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state))
    }

    /// Shared state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve HTTP until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error on bind or server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!(
            public_base_url = %self.state.config.public_base_url,
            service_id = %self.state.config.service_id,
            "HTTP server listening on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("state", &self.state).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
