use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::{build_state, create_app};

/// Signal sent when server is ready to accept connections
pub struct ServerReady {
    pub addr: SocketAddr,
}

/// Run the HTTP server until Ctrl-C is received.
/// If `ready_tx` is provided, sends the bound address once the listener is ready
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<ServerReady>>,
) -> Result<()> {
    let state = build_state(&config).context("Invalid server configuration")?;
    let app = create_app(state);

    let listener = TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Snake-headed lab generator listening on: {addr}");

    if let Some(tx) = ready_tx {
        let _ = tx.send(ServerReady { addr });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
