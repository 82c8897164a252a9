//! Faucet service binary

use clap::Parser;
use faucet_service::api::router;
use faucet_service::rpc::RpcClient;
use faucet_service::{ChainRegistry, FaucetService, RateLimiter, ServiceConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Faucet service CLI
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-chain testnet faucet", long_about = None)]
struct Args {
    /// Server bind address
    #[arg(long)]
    server_addr: Option<String>,

    /// Chain registry JSON file (built-in catalog when omitted)
    #[arg(long)]
    chains: Option<PathBuf>,

    /// Rate-limit record TTL in seconds
    #[arg(long)]
    limiter_ttl: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = if args.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServiceConfig::from_env();
    if let Some(addr) = args.server_addr {
        config.server_addr = addr;
    }
    if let Some(path) = args.chains {
        config.registry_path = Some(path);
    }
    if let Some(ttl) = args.limiter_ttl {
        config.limiter_ttl_secs = ttl;
    }

    let registry = match &config.registry_path {
        Some(path) => ChainRegistry::load(path)?,
        None => ChainRegistry::builtin(),
    };

    let faucet_chains: Vec<u64> = registry.faucet_chains().map(|c| c.id).collect();
    info!("Chain registry loaded: {} chains, faucet on {:?}", registry.chains.len(), faucet_chains);

    let limiter = RateLimiter::new(
        config.limiter_capacity,
        config.limiter_ttl(),
        registry.max_rate_limit_window(),
    );

    let service = Arc::new(FaucetService::new(registry, limiter, RpcClient::new()));

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = router(service).layer(cors);

    let addr: SocketAddr = config.server_addr.parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
