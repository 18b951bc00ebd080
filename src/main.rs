//! chat-relay server binary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use chat_relay::config::{Cli, Config};
use chat_relay::metrics::Metrics;
use chat_relay::relay::UpstreamClient;
use chat_relay::server::chat_api::{build_router, AppState};

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

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("chat-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration; refuses to start without upstream credentials.
    let config = Arc::new(Config::load(&cli.config)?);

    info!(
        upstream = config.upstream.base_url,
        connect_timeout_secs = config.server.connect_timeout_secs,
        "Configuration loaded"
    );

    let upstream = UpstreamClient::new(
        config.upstream.clone(),
        Duration::from_secs(config.server.connect_timeout_secs),
    )?;

    // Build application state.
    let state = Arc::new(AppState {
        upstream,
        config: config.clone(),
        metrics: Metrics::new()?,
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = cli.listen;
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
