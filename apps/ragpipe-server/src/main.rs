use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ragpipe_core::config::Config;
use ragpipe_pipeline::bootstrap::from_settings;

mod handlers;

use handlers::{router, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "ragpipe-server",
    about = "HTTP API for ingesting text and answering questions over it"
)]
struct ServerCli {
    /// Directory holding config.toml and the config.<env>.toml overlays.
    #[arg(long, env = "RAGPIPE_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Address to bind the HTTP server to (host:port); overrides server.host/server.port.
    #[arg(long, env = "RAGPIPE_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = ServerCli::parse();
    let config = Config::load_from(&cli.config_dir).context("loading configuration")?;
    let settings = config.settings()?;
    info!(env = config.env_name(), "configuration loaded");

    let pipeline = from_settings(&settings).await?;
    let app = router(AppState::new(Arc::new(pipeline)));

    let bind = cli.bind.unwrap_or_else(|| settings.server.bind_addr());
    let addr: SocketAddr = bind.parse().with_context(|| format!("invalid bind address {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "ragpipe-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
