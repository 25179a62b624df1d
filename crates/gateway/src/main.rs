//! Waypost Gateway - publishes the upstream content tree as a public URL space
//!
//! The gateway loads one snapshot of manifest + overrides + protections at
//! startup, then answers every request from it: canonical redirects, access
//! challenges, pass-throughs for the renderer, plus the sitemap and admin
//! surfaces.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use clap::Parser;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use service::{Config, MemoryUpstream, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Waypost Gateway - publishes the upstream content tree as a public URL space
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Directory holding the snapshot artifacts
    #[arg(short, long, default_value = "snapshot")]
    snapshot_dir: PathBuf,

    /// Path of the login surface
    #[arg(long, default_value = "/login")]
    login_path: String,

    /// Mark session cookies Secure (set when serving over TLS)
    #[arg(long)]
    secure_cookies: bool,

    /// Hex-encoded Ed25519 public key of the federated identity provider
    #[arg(long)]
    identity_key: Option<String>,

    /// Subject allowed past federated-identity rules (repeatable)
    #[arg(long = "allow-subject")]
    allowed_subjects: Vec<String>,

    /// Disable the admin write API (read-only mirror mode)
    #[arg(long)]
    read_only: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    tracing::info!("Starting Waypost Gateway ({})", common::version::build_info());

    // Create configuration
    let config = Config {
        snapshot_dir: args.snapshot_dir,
        login_path: args.login_path,
        cookie_secure: args.secure_cookies,
        identity_key_hex: args.identity_key,
        allowed_subjects: args.allowed_subjects,
        admin_enabled: !args.read_only,
        log_level,
        ..Config::default()
    };

    // Create state. The in-memory upstream keeps the binary self-contained;
    // deployments talking to the real content service swap in its client.
    let upstream = Arc::new(MemoryUpstream::new());
    let state = match ServiceState::from_config(&config, upstream) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create service state: {}", e);
            std::process::exit(1);
        }
    };

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    let shutdown_handle = tokio::spawn(graceful_shutdown);

    // Build gateway router
    let listen_addr = SocketAddr::from_str(&format!("0.0.0.0:{}", args.port))?;
    let router = build_gateway_router(state);

    tracing::info!("Gateway listening on {}", listen_addr);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    let mut server_rx = shutdown_rx.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = server_rx.changed().await;
        })
        .await?;

    // Wait for the signal task to wind down
    let _ = tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, shutdown_handle).await;

    tracing::info!("Gateway shutdown complete");
    Ok(())
}

/// Build the gateway router with CORS and request tracing applied.
fn build_gateway_router(state: ServiceState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, ORIGIN, CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    let trace_layer = TraceLayer::new_for_http();

    service::http::router(state).layer(cors_layer).layer(trace_layer)
}
