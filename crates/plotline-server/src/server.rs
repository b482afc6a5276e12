//! Chart service lifecycle.
//!
//! [`start_server`] binds, reports readiness (or the bind failure)
//! through a oneshot channel, then serves until the shared shutdown
//! trigger fires. The session orchestrator runs this future on its
//! background runtime and waits on the readiness channel with a bounded
//! timeout.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::error::ServerError;
use crate::router::build_router;
use crate::state::ServiceState;

/// Configuration for the chart service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to.
    pub host: String,
    /// The TCP port to listen on. Port 0 binds an ephemeral port; the
    /// actual address is reported through the readiness channel.
    pub port: u16,
    /// Directory holding the front-end assets.
    pub assets_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 15555,
            assets_dir: PathBuf::from("build"),
        }
    }
}

/// Start the chart service.
///
/// Binds to the configured address and reports the bound address (or the
/// bind failure) through `ready` before serving. Serves until
/// `state.shutdown` is notified, then drains gracefully.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server encounters
/// a fatal I/O error. Bind failures are also delivered through `ready` so
/// the caller never waits out its startup timeout on a dead service.
pub async fn start_server(
    config: ServerConfig,
    state: Arc<ServiceState>,
    ready: oneshot::Sender<Result<SocketAddr, ServerError>>,
) -> Result<(), ServerError> {
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            let err = ServerError::Bind(format!("bind failed on {addr}: {e}"));
            error!(error = %err, "chart service failed to start");
            let _ = ready.send(Err(err.clone()));
            return Err(err);
        }
    };

    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;
    info!(%local_addr, "chart service listening");

    let router = build_router(Arc::clone(&state), &config.assets_dir);
    let _ = ready.send(Ok(local_addr));

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_state.shutdown.notified().await;
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("chart service stopped");
    Ok(())
}
