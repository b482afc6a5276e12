//! The session orchestrator.
//!
//! [`Session`] owns the chart service, the renderer control thread, the
//! figure, and the rendezvous gates, and exposes the caller-facing
//! lifecycle: `start`, `show`, `resize`, `save`, `stop`. Startup is
//! sequenced service-first and unwinds every partially acquired resource
//! on failure; shutdown runs every cleanup step even when earlier steps
//! fail.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use plotline_model::Figure;
use plotline_protocol::ServerMessage;
use plotline_server::{ServerConfig, ServiceState};
use tracing::{error, info, warn};

use crate::config::SessionConfig;
use crate::control::RendererHandle;
use crate::error::SessionError;
use crate::renderer::{ProcessRenderer, Renderer, RendererConfig};
use crate::service::ServiceHandle;

/// Length of the session access token.
const TOKEN_LENGTH: usize = 25;

/// Extra slack granted to a cross-context wait beyond the gate timeout it
/// carries internally, so the gate verdict (not the transport) decides.
const CROSS_CONTEXT_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Constructed, not yet started.
    Created,
    /// `start` is in progress.
    Starting,
    /// Fully started; operations are accepted.
    Running,
    /// `stop` is in progress.
    Stopping,
    /// Stopped; terminal.
    Stopped,
    /// `start` failed and its partial resources were unwound; terminal.
    FailedStart,
}

/// A live chart session.
///
/// All methods are synchronous and must be called from outside any async
/// runtime; the session drives its own background runtime internally.
pub struct Session {
    config: SessionConfig,
    token: String,
    state: Arc<ServiceState>,
    service: Option<ServiceHandle>,
    renderer: Option<RendererHandle>,
    pending_renderer: Option<Box<dyn Renderer>>,
    phase: SessionPhase,
    bound_port: Option<u16>,
}

impl Session {
    /// Create a session that will drive a Chromium-family browser.
    pub fn new(config: SessionConfig) -> Self {
        let renderer = ProcessRenderer::new(RendererConfig {
            browser: config.browser.clone(),
            headless: config.headless,
            hidpi: config.hidpi,
            window: config.window,
        });
        Self::with_renderer(config, Box::new(renderer))
    }

    /// Create a session with an explicit renderer collaborator.
    pub fn with_renderer(config: SessionConfig, renderer: Box<dyn Renderer>) -> Self {
        let token = generate_token();
        let state = Arc::new(ServiceState::new(token.clone()));
        Self {
            config,
            token,
            state,
            service: None,
            renderer: None,
            pending_renderer: Some(renderer),
            phase: SessionPhase::Created,
            bound_port: None,
        }
    }

    /// The session access token carried in the page URL.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The page URL remote clients load, including the access token.
    pub fn url(&self) -> String {
        let port = self.bound_port.unwrap_or(self.config.port);
        format!(
            "http://{}:{}/?token={}",
            self.config.host, port, self.token
        )
    }

    /// Access the figure under its lock.
    ///
    /// The lock is held for the duration of the closure; keep the work
    /// short, since interactive updates contend on the same lock.
    pub fn with_figure<R>(&self, f: impl FnOnce(&mut Figure) -> R) -> R {
        let mut figure = self.state.figure.blocking_lock();
        f(&mut figure)
    }

    /// Start the session: launch the service on its background runtime,
    /// attach the renderer, and wait for the first client to connect.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Startup`] on any failure. Whatever was
    /// partially acquired (service, renderer) is unwound before the error
    /// is reported, and the session lands in [`SessionPhase::FailedStart`].
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Created {
            return Err(SessionError::Startup(format!(
                "session cannot start from the {:?} phase",
                self.phase
            )));
        }
        self.phase = SessionPhase::Starting;
        info!(host = %self.config.host, port = self.config.port, "starting chart session");

        if let Err(e) = self.start_service() {
            self.phase = SessionPhase::FailedStart;
            return Err(e);
        }

        if let Err(e) = self.attach_renderer() {
            error!(error = %e, "startup failed, unwinding partial resources");
            let unwind_failures = self.teardown();
            for failure in unwind_failures {
                warn!(%failure, "cleanup step failed during startup unwind");
            }
            self.phase = SessionPhase::FailedStart;
            // Whatever went wrong, the caller sees one startup failure.
            return Err(match e {
                SessionError::Startup(_) => e,
                other => SessionError::Startup(other.to_string()),
            });
        }

        self.phase = SessionPhase::Running;
        info!(url = %self.url(), "chart session running");
        Ok(())
    }

    /// Launch the network service and record the bound address.
    fn start_service(&mut self) -> Result<(), SessionError> {
        let server_config = ServerConfig {
            host: self.config.host.clone(),
            port: self.config.port,
            assets_dir: self.config.assets_dir.clone(),
        };
        let service = ServiceHandle::start(
            server_config,
            Arc::clone(&self.state),
            self.config.connect_timeout,
        )?;
        self.bound_port = Some(service.local_addr().port());
        self.service = Some(service);
        Ok(())
    }

    /// Start the renderer control thread, open the chart page, and await
    /// the client-connected gate.
    fn attach_renderer(&mut self) -> Result<(), SessionError> {
        let renderer = self
            .pending_renderer
            .take()
            .ok_or_else(|| SessionError::Startup(String::from("renderer already consumed")))?;
        let handle = RendererHandle::spawn(renderer)?;
        let url = self.url();
        let drive = (|| {
            handle.start(self.config.renderer_timeout)?;
            handle.open(&url, self.config.renderer_timeout)
        })();
        // Keep the handle either way so teardown reaches it.
        self.renderer = Some(handle);
        drive?;

        let service = self.service.as_ref().ok_or(SessionError::NotRunning)?;
        let state = Arc::clone(&self.state);
        let timeout = self.config.connect_timeout;
        let connected = service.run(
            async move { state.client_connected.wait(timeout).await },
            timeout + CROSS_CONTEXT_GRACE,
        )?;
        if !connected {
            return Err(SessionError::Startup(format!(
                "no client attached within {timeout:?}"
            )));
        }
        Ok(())
    }

    /// Push the current figure to every attached client and wait for the
    /// render acknowledgement.
    ///
    /// With `blocking` the call additionally suspends until the caller
    /// presses enter, mirroring an interactive viewing session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::RenderTimeout`] when no acknowledgement
    /// arrives in time; the session stays usable.
    pub fn show(&mut self, blocking: bool) -> Result<(), SessionError> {
        self.ensure_running()?;
        let snapshot = self.with_figure(Figure::snapshot);

        let service = self.service.as_ref().ok_or(SessionError::NotRunning)?;
        let state = Arc::clone(&self.state);
        let timeout = self.config.render_timeout;
        let acked = service.run(
            async move {
                state.broadcast(ServerMessage::UpdateGraph(Box::new(snapshot)));
                state.render_acked.wait(timeout).await
            },
            timeout + CROSS_CONTEXT_GRACE,
        )?;
        if !acked {
            return Err(SessionError::RenderTimeout { waited: timeout });
        }

        if blocking {
            wait_for_enter()?;
        }
        Ok(())
    }

    /// Resize the renderer viewport. A renderer-only operation; no
    /// protocol exchange is involved.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Renderer`] when the renderer rejects the
    /// resize or the control command times out.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SessionError> {
        self.ensure_running()?;
        let renderer = self.renderer.as_ref().ok_or(SessionError::NotRunning)?;
        renderer.resize(width, height, self.config.renderer_timeout)?;
        Ok(())
    }

    /// Capture the rendered chart and write it to `path`, overwriting any
    /// existing file.
    ///
    /// One capture exchange is outstanding at a time; the request is only
    /// sent after the previous buffer is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SaveTimeout`] when the image never
    /// arrives. No file is created or touched on timeout.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        self.ensure_running()?;

        let service = self.service.as_ref().ok_or(SessionError::NotRunning)?;
        let state = Arc::clone(&self.state);
        let timeout = self.config.save_timeout;
        let received = service.run(
            async move {
                *state.image_data.lock().await = None;
                state.broadcast(ServerMessage::RequestImageData);
                state.image_received.wait(timeout).await
            },
            timeout + CROSS_CONTEXT_GRACE,
        )?;
        if !received {
            return Err(SessionError::SaveTimeout { waited: timeout });
        }

        let bytes = self.state.image_data.blocking_lock().take();
        let Some(bytes) = bytes else {
            return Err(SessionError::SaveTimeout { waited: timeout });
        };
        std::fs::write(path.as_ref(), &bytes)?;
        info!(path = %path.as_ref().display(), bytes = bytes.len(), "figure saved");
        Ok(())
    }

    /// Stop the session. Always safe to call, in any phase, repeatedly.
    ///
    /// Order: close the renderer window, stop its control thread,
    /// disconnect clients and drain the service (bounded), tear down the
    /// background runtime (cancelling pending work). Every step runs even
    /// if an earlier one failed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ShutdownPartial`] listing every failed
    /// step; success means all steps completed cleanly.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Stopped | SessionPhase::FailedStart => return Ok(()),
            SessionPhase::Created => {
                self.phase = SessionPhase::Stopped;
                return Ok(());
            }
            _ => {}
        }
        self.phase = SessionPhase::Stopping;
        let failures = self.teardown();
        self.phase = SessionPhase::Stopped;

        if failures.is_empty() {
            info!("chart session stopped");
            Ok(())
        } else {
            Err(SessionError::ShutdownPartial { failures })
        }
    }

    /// Run every cleanup step, collecting failures instead of stopping at
    /// the first one.
    fn teardown(&mut self) -> Vec<String> {
        let mut failures = Vec::new();

        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.close(self.config.renderer_timeout) {
                warn!(error = %e, "renderer close failed");
                failures.push(format!("renderer close: {e}"));
            }
            if let Err(e) = renderer.shutdown() {
                warn!(error = %e, "renderer control thread shutdown failed");
                failures.push(format!("renderer thread: {e}"));
            }
        }

        if let Some(mut service) = self.service.take() {
            if let Err(e) = service.stop(self.config.disconnect_timeout) {
                warn!(error = %e, "service stop failed");
                failures.push(format!("service stop: {e}"));
            }
        }

        failures
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Running {
            Ok(())
        } else {
            Err(SessionError::NotRunning)
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if matches!(
            self.phase,
            SessionPhase::Starting | SessionPhase::Running | SessionPhase::Stopping
        ) {
            if let Err(e) = self.stop() {
                warn!(error = %e, "session stop during drop reported failures");
            }
        }
    }
}

/// Generate the session access token.
fn generate_token() -> String {
    use rand::Rng as _;
    use rand::distr::Alphanumeric;

    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Suspend until the caller presses enter.
fn wait_for_enter() -> Result<(), std::io::Error> {
    use std::io::Write as _;

    let mut stdout = std::io::stdout();
    write!(stdout, "Press enter to continue...")?;
    stdout.flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::renderer::NullRenderer;

    /// Short-timeout config on an ephemeral port.
    fn test_config(assets_dir: std::path::PathBuf) -> SessionConfig {
        SessionConfig {
            port: 0,
            assets_dir,
            render_timeout: Duration::from_millis(100),
            save_timeout: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(200),
            disconnect_timeout: Duration::from_secs(2),
            ..SessionConfig::default()
        }
    }

    fn test_session(assets: &tempfile::TempDir) -> Session {
        Session::with_renderer(
            test_config(assets.path().to_path_buf()),
            Box::new(NullRenderer::new()),
        )
    }

    #[test]
    fn tokens_are_long_and_unique() {
        let assets = tempfile::tempdir().unwrap();
        let a = test_session(&assets);
        let b = test_session(&assets);
        assert_eq!(a.token().len(), TOKEN_LENGTH);
        assert_ne!(a.token(), b.token());
        assert!(a.url().contains("?token="));
    }

    #[test]
    fn figure_mutations_are_visible_across_calls() {
        let assets = tempfile::tempdir().unwrap();
        let session = test_session(&assets);
        session.with_figure(|figure| {
            figure.new_plot();
        });
        assert_eq!(session.with_figure(|figure| figure.plot_count()), 1);
    }

    #[test]
    fn start_without_a_client_unwinds_and_fails() {
        let assets = tempfile::tempdir().unwrap();
        let mut session = test_session(&assets);

        // The null renderer never loads the page, so no client attaches
        // and startup must time out and unwind.
        let err = session.start().unwrap_err();
        assert!(matches!(err, SessionError::Startup(_)));
        assert_eq!(session.phase(), SessionPhase::FailedStart);

        // stop is safe and idempotent after a failed start.
        session.stop().unwrap();
        session.stop().unwrap();
    }

    #[test]
    fn operations_require_a_running_session() {
        let assets = tempfile::tempdir().unwrap();
        let mut session = test_session(&assets);

        assert!(matches!(session.show(false), Err(SessionError::NotRunning)));
        assert!(matches!(session.resize(1, 1), Err(SessionError::NotRunning)));
        assert!(matches!(
            session.save(assets.path().join("x.png")),
            Err(SessionError::NotRunning)
        ));
    }

    #[test]
    fn stop_before_start_is_clean() {
        let assets = tempfile::tempdir().unwrap();
        let mut session = test_session(&assets);
        session.stop().unwrap();
        assert_eq!(session.phase(), SessionPhase::Stopped);
    }

    #[test]
    fn save_without_a_client_times_out_and_writes_nothing() {
        let assets = tempfile::tempdir().unwrap();
        let mut session = test_session(&assets);

        // Bring up the service alone and force the running phase; no
        // client ever attaches, so the capture exchange must time out.
        session.phase = SessionPhase::Starting;
        session.start_service().unwrap();
        session.phase = SessionPhase::Running;

        let target = assets.path().join("capture.png");
        let err = session.save(&target).unwrap_err();
        assert!(matches!(err, SessionError::SaveTimeout { .. }));
        assert!(!target.exists());

        session.stop().unwrap();
    }

    #[test]
    fn show_without_a_client_reports_a_render_timeout() {
        let assets = tempfile::tempdir().unwrap();
        let mut session = test_session(&assets);
        session.phase = SessionPhase::Starting;
        session.start_service().unwrap();
        session.phase = SessionPhase::Running;

        let err = session.show(false).unwrap_err();
        assert!(matches!(err, SessionError::RenderTimeout { .. }));

        // The session stays usable after a protocol timeout.
        assert_eq!(session.phase(), SessionPhase::Running);
        session.stop().unwrap();
    }

    #[test]
    fn save_succeeds_once_the_image_gate_is_fed() {
        let assets = tempfile::tempdir().unwrap();
        let mut session = test_session(&assets);
        session.phase = SessionPhase::Starting;
        session.start_service().unwrap();
        session.phase = SessionPhase::Running;

        // Stand in for the remote client: answer the next capture
        // request with image bytes.
        let state = Arc::clone(&session.state);
        let service = session.service.as_ref().unwrap();
        let mut inbound = state.subscribe();
        let responder = Arc::clone(&state);
        service
            .run(
                async move {
                    tokio::spawn(async move {
                        while let Ok(message) = inbound.recv().await {
                            if message == ServerMessage::RequestImageData {
                                *responder.image_data.lock().await =
                                    Some(b"png-bytes".to_vec());
                                responder.image_received.signal();
                                break;
                            }
                        }
                    });
                },
                Duration::from_secs(1),
            )
            .unwrap();

        let target = assets.path().join("capture.png");
        session.save(&target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"png-bytes");

        session.stop().unwrap();
    }
}
