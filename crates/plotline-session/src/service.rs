//! The background service runtime.
//!
//! [`ServiceHandle`] owns the Tokio runtime that hosts the chart service.
//! The caller's thread never enters that runtime directly: work is
//! submitted as a future, and the caller waits on the spawned task with a
//! deadline. Stopping trips the shared shutdown trigger, joins the server
//! task with a bounded timeout, then tears the runtime down, cancelling
//! anything still pending.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use plotline_server::{ServerConfig, ServerError, ServiceState, start_server};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::SessionError;

/// Handle to the background runtime hosting the chart service.
pub struct ServiceHandle {
    runtime: Option<tokio::runtime::Runtime>,
    server_task: Option<tokio::task::JoinHandle<Result<(), ServerError>>>,
    state: Arc<ServiceState>,
    local_addr: SocketAddr,
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl ServiceHandle {
    /// Build the runtime, launch the service on it, and wait (bounded)
    /// until it reports ready or failed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Startup`] when the runtime cannot be
    /// built, the service fails to bind, or readiness is not reported
    /// within `ready_timeout`. No background resources survive a failed
    /// start.
    pub fn start(
        config: ServerConfig,
        state: Arc<ServiceState>,
        ready_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("plotline-service")
            .enable_all()
            .build()
            .map_err(|e| SessionError::Startup(format!("service runtime: {e}")))?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let server_task = runtime.spawn(start_server(config, Arc::clone(&state), ready_tx));

        let readiness =
            runtime.block_on(async { tokio::time::timeout(ready_timeout, ready_rx).await });
        let local_addr = match readiness {
            Ok(Ok(Ok(addr))) => addr,
            Ok(Ok(Err(server_error))) => {
                runtime.shutdown_timeout(Duration::from_secs(1));
                return Err(SessionError::Startup(format!(
                    "service failed to start: {server_error}"
                )));
            }
            Ok(Err(_dropped)) => {
                runtime.shutdown_timeout(Duration::from_secs(1));
                return Err(SessionError::Startup(String::from(
                    "service exited before reporting readiness",
                )));
            }
            Err(_elapsed) => {
                runtime.shutdown_timeout(Duration::from_secs(1));
                return Err(SessionError::Startup(format!(
                    "service did not report readiness within {ready_timeout:?}"
                )));
            }
        };

        info!(%local_addr, "service runtime started");
        Ok(Self {
            runtime: Some(runtime),
            server_task: Some(server_task),
            state,
            local_addr,
        })
    }

    /// The address the service actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared service state.
    pub fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }

    /// Run `future` on the service runtime and wait for its result with a
    /// deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] when the deadline elapses, the
    /// task fails, or the runtime is already stopped. The future itself
    /// keeps running on the service runtime after a deadline miss; every
    /// submitted future carries its own shorter internal timeout, so it
    /// finishes on its own.
    pub fn run<F, T>(&self, future: F, wait: Duration) -> Result<T, SessionError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| SessionError::Service(String::from("service runtime is stopped")))?;

        let task = runtime.spawn(future);
        match runtime.block_on(async { tokio::time::timeout(wait, task).await }) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_error)) => Err(SessionError::Service(format!(
                "cross-context call failed: {join_error}"
            ))),
            Err(_elapsed) => Err(SessionError::Service(format!(
                "cross-context call missed its {wait:?} deadline"
            ))),
        }
    }

    /// Stop the service: trip the shutdown trigger, join the server task
    /// with a bounded timeout, then tear the runtime down, cancelling any
    /// still-pending work. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] when the service erred or did
    /// not drain in time. The runtime is torn down either way.
    pub fn stop(&mut self, timeout: Duration) -> Result<(), SessionError> {
        let Some(runtime) = self.runtime.take() else {
            return Ok(());
        };

        self.state.shutdown.notify_waiters();

        let mut failure = None;
        if let Some(task) = self.server_task.take() {
            match runtime.block_on(async { tokio::time::timeout(timeout, task).await }) {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(server_error))) => {
                    failure = Some(format!("service exited with error: {server_error}"));
                }
                Ok(Err(join_error)) => {
                    failure = Some(format!("service task failed: {join_error}"));
                }
                Err(_elapsed) => {
                    failure = Some(format!("service did not drain within {timeout:?}"));
                }
            }
        }

        // Cancels any still-pending cross-context work and joins the
        // runtime's worker threads.
        runtime.shutdown_timeout(timeout);

        match failure {
            None => {
                info!("service runtime stopped");
                Ok(())
            }
            Some(message) => {
                warn!(%message, "service stop was not clean");
                Err(SessionError::Service(message))
            }
        }
    }
}
