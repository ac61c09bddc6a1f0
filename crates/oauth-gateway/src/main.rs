//! OAuth Gateway - Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use oauth_gateway::config::Config;
use oauth_gateway::server::Gateway;
use oauth_gateway::users::{InMemoryUserHandler, UserHandler};

#[derive(Parser, Debug)]
#[command(name = "oauth-gateway")]
#[command(about = "OAuth 2.0 / OpenID Connect / OpenID4VCI endpoints backed by a hosted authorization server API")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Backend API base URL (e.g., https://us.authlete.com)
    #[arg(long, env = "API_BASE_URL")]
    api_base_url: Option<String>,

    /// Public base URL of this gateway, used for DPoP htu values
    #[arg(long, env = "PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// JSON file with end-user records (defaults to bundled sample users)
    #[arg(long, env = "USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting OAuth gateway");

    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_base_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = cli.public_base_url {
        config.public_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = cli.users_file {
        config.users_file = Some(path);
    }

    if !config.has_service_token() {
        tracing::warn!("API_SERVICE_ACCESS_TOKEN is not set; backend calls will be rejected");
    }
    if config.pairwise_salt.is_empty() {
        tracing::warn!("PAIRWISE_SALT is not set; pairwise subjects are unsalted");
    }

    let users: Arc<dyn UserHandler> = match config.users_file {
        Some(ref path) => Arc::new(InMemoryUserHandler::from_file(path)?),
        None => {
            tracing::info!("Using bundled sample users");
            Arc::new(InMemoryUserHandler::with_sample_users())
        }
    };

    Gateway::new(config, users)?.run_http(cli.port).await
}
