//! chat-relay binary: loads configuration and serves the relay over HTTP.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use chat_relay::config::{Cli, Config};
use chat_relay::credential::CredentialSource;
use chat_relay::metrics::RelayMetrics;
use chat_relay::relay::Relay;
use chat_relay::server::routes::{build_router, AppState};
use chat_relay::upstream::openai::OpenAiProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "chat_relay=debug,tower_http=debug"
    } else {
        "chat_relay=info,tower_http=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    info!("chat-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);

    info!(
        upstream = config.upstream.base_url,
        default_model = config.upstream.default_model,
        credentials = config.credentials.source.describe(),
        stream_timeout_secs = ?config.upstream.stream_timeout_secs,
        "Configuration loaded"
    );

    // Checked again on every request.
    if let CredentialSource::Environment(var) = &config.credentials.source {
        if std::env::var(var).map_or(true, |v| v.trim().is_empty()) {
            warn!(variable = var, "API key variable is not set; chat requests will fail until it is");
        }
    }

    let provider = Arc::new(OpenAiProvider::new(&config.upstream)?);
    let metrics = Arc::new(RelayMetrics::new()?);
    let relay = Relay::new(provider, &config, metrics.clone());

    let state = Arc::new(AppState { relay, metrics });
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen.clone();
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
