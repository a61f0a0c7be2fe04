//! HTTP server hosting one cemetery path network.

mod api;
mod config;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::{AppState, load_network};

#[derive(Debug, Parser)]
#[command(version, about = "Serve walking routes over a cemetery path network")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Address to listen on, overriding the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// GeoJSON road geometry, overriding the configuration
    #[arg(long)]
    geometry: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(geometry) = args.geometry {
        config.network.geometry_path = geometry;
    }

    let path = config.network.geometry_path.clone();
    let build = config.network.build;
    let network = tokio::task::spawn_blocking(move || load_network(&path, &build)).await??;
    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        "Network ready"
    );

    let bind = config.server.bind;
    let app = api::create_router(Arc::new(AppState::new(network, config)));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
