use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tokio::net::TcpListener;

use anyhow::anyhow;

use hotline_gateway::{ServerConfig, domain::knowledge::KnowledgeBase, routes, state::AppState};

/// Hotline Gateway - Real-time telephony relay for a speech-to-speech agent
#[derive(Parser, Debug)]
#[command(name = "hotline-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for the outbound TLS agent connection.
    // This must be done before any TLS connections are attempted.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment. A missing agent API key
    // is fatal here: the process refuses to accept sessions without it.
    let config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    // Build the knowledge base index once, up front, so sessions only ever
    // see a ready capability.
    info!(
        "Building knowledge base index from {}",
        config.knowledge_dir.display()
    );
    let knowledge = Arc::new(KnowledgeBase::build(&config.knowledge_dir)?);
    info!("Knowledge base ready: {} chunks indexed", knowledge.len());

    let address = config.address();
    let tls_config = config.tls.clone();
    let is_tls_enabled = config.is_tls_enabled();
    println!("Starting server on {address}");

    // Create application state
    let app_state = Arc::new(AppState::new(config, knowledge));
    info!(
        "Capability registry ready: {} functions registered",
        app_state.capabilities.len()
    );

    // Public health check route (no auth) plus the telephony WebSocket route
    let public_routes = Router::new().route(
        "/",
        axum::routing::get(hotline_gateway::handlers::api::health_check),
    );

    let app = public_routes
        .merge(routes::telephony::create_telephony_router())
        .with_state(app_state);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    // Start server with or without TLS
    if is_tls_enabled {
        let tls = tls_config.expect("TLS config must be present when TLS is enabled");

        let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to load TLS certificates from {} and {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                )
            })?;

        println!("Server listening on https://{} (TLS enabled)", socket_addr);

        axum_server::bind_rustls(socket_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|e| anyhow!("TLS server error: {}", e))?;
    } else {
        println!("Server listening on http://{}", socket_addr);

        let listener = TcpListener::bind(&socket_addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
