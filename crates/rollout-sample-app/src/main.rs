//! rollout-sample-app: the trivial HTTP application baked into the
//! machine image. Serves static JSON endpoints for the load balancer
//! health check and for poking at a deployed instance.

mod handlers;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use rollout_common::defaults::{DEFAULT_APP_PORT, DEFAULT_ENVIRONMENT, DEFAULT_PROJECT};
use server::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rollout-sample-app")]
#[command(about = "Sample HTTP application for image pipeline testing")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_APP_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Project name reported by the info endpoint
    #[arg(long, env = "PROJECT", default_value = DEFAULT_PROJECT)]
    project: String,

    /// Environment name reported by the info endpoint
    #[arg(long, env = "ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    environment: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState::from_env(args.project, args.environment));
    let app = server::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    info!(addr = %addr, "Starting sample application");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}
