//! The renderer collaborator: the external browser surface.
//!
//! The [`Renderer`] trait is the whole contract the session has with the
//! browser: start, open a URL, resize the viewport, close. Each call may
//! fail; a failure during `start` triggers a best-effort `close` before
//! the error propagates (enforced centrally by the control loop).
//!
//! [`ProcessRenderer`] drives a Chromium-family browser as a child
//! process in app mode. [`NullRenderer`] records calls and succeeds,
//! for tests and headless embedding.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info};

/// Errors that can occur while driving the renderer collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RendererError {
    /// The browser could not be located or spawned.
    #[error("renderer launch error: {0}")]
    Launch(String),

    /// A control command failed or timed out.
    #[error("renderer control error: {0}")]
    Control(String),
}

/// The control surface of the external browser renderer.
///
/// Implementations are driven exclusively from the session's renderer
/// control thread; the `Send` bound moves the value onto that thread.
pub trait Renderer: Send {
    /// Prepare the renderer (locate the browser, allocate resources).
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Launch`] when the renderer cannot be
    /// prepared. The control loop closes the renderer best-effort before
    /// propagating the error.
    fn start(&mut self) -> Result<(), RendererError>;

    /// Navigate the renderer to `url`, opening the window if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Launch`] when the browser cannot be
    /// spawned.
    fn open(&mut self, url: &str) -> Result<(), RendererError>;

    /// Resize the viewport to `width` by `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Control`] when the running window cannot
    /// be adjusted.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError>;

    /// Close the window and release the browser.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Control`] on failure; callers treat close
    /// failures as best-effort.
    fn close(&mut self) -> Result<(), RendererError>;
}

/// Configuration for [`ProcessRenderer`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Explicit browser binary; when absent the PATH is searched.
    pub browser: Option<String>,
    /// Launch headless (`--headless=new`).
    pub headless: bool,
    /// Double the device scale factor for crisp captures on high-density
    /// displays. A renderer configuration concern, not session state.
    pub hidpi: bool,
    /// Initial window size in pixels.
    pub window: (u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            browser: None,
            headless: false,
            hidpi: true,
            window: (1280, 800),
        }
    }
}

/// Browser binaries probed on the PATH, most specific first.
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "brave-browser",
    "microsoft-edge",
];

/// A renderer that drives a Chromium-family browser as a child process.
///
/// The browser runs in app mode (no tabs, no location bar) pointed at the
/// chart page. A plain OS window cannot be resized from the outside, so
/// `resize` relaunches the window at the requested size.
#[derive(Debug)]
pub struct ProcessRenderer {
    config: RendererConfig,
    binary: Option<PathBuf>,
    child: Option<Child>,
    url: Option<String>,
    window: (u32, u32),
}

impl ProcessRenderer {
    /// Create a process renderer from its configuration.
    pub fn new(config: RendererConfig) -> Self {
        let window = config.window;
        Self {
            config,
            binary: None,
            child: None,
            url: None,
            window,
        }
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(error = %e, "browser process already gone");
            }
            let _ = child.wait();
        }
    }
}

impl Renderer for ProcessRenderer {
    fn start(&mut self) -> Result<(), RendererError> {
        let binary = match &self.config.browser {
            Some(explicit) => PathBuf::from(explicit),
            None => find_browser().ok_or_else(|| {
                RendererError::Launch(String::from(
                    "no Chromium-family browser found on PATH; set an explicit binary",
                ))
            })?,
        };
        info!(browser = %binary.display(), "renderer ready");
        self.binary = Some(binary);
        Ok(())
    }

    fn open(&mut self, url: &str) -> Result<(), RendererError> {
        let binary = self
            .binary
            .clone()
            .ok_or_else(|| RendererError::Control(String::from("renderer not started")))?;

        // At most one window per session.
        self.kill_child();

        let mut command = Command::new(&binary);
        command
            .arg(format!("--app={url}"))
            .arg(format!("--window-size={},{}", self.window.0, self.window.1))
            .arg("--no-first-run")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if self.config.headless {
            command.arg("--headless=new");
        }
        if self.config.hidpi {
            command.arg("--force-device-scale-factor=2");
        }

        let child = command.spawn().map_err(|e| {
            RendererError::Launch(format!("failed to launch {}: {e}", binary.display()))
        })?;
        info!(pid = child.id(), url, "browser window opened");
        self.child = Some(child);
        self.url = Some(url.to_owned());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.window = (width, height);
        match self.url.clone() {
            Some(url) if self.child.is_some() => self.open(&url),
            _ => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), RendererError> {
        self.kill_child();
        Ok(())
    }
}

impl Drop for ProcessRenderer {
    fn drop(&mut self) {
        self.kill_child();
    }
}

/// Locate a Chromium-family browser on the PATH.
fn find_browser() -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for candidate in BROWSER_CANDIDATES {
            let full = dir.join(candidate);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

/// A renderer that records calls and always succeeds.
///
/// Used by tests and by embeddings that render nowhere (a remote client
/// attaches on its own instead of being launched).
#[derive(Debug, Default)]
pub struct NullRenderer {
    /// Whether `start` has been called.
    pub started: bool,
    /// The last URL passed to `open`.
    pub opened: Option<String>,
    /// The last size passed to `resize`.
    pub size: Option<(u32, u32)>,
    /// Whether `close` has been called.
    pub closed: bool,
}

impl NullRenderer {
    /// Create an inert renderer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for NullRenderer {
    fn start(&mut self) -> Result<(), RendererError> {
        self.started = true;
        Ok(())
    }

    fn open(&mut self, url: &str) -> Result<(), RendererError> {
        self.opened = Some(url.to_owned());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.size = Some((width, height));
        Ok(())
    }

    fn close(&mut self) -> Result<(), RendererError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn null_renderer_records_the_call_sequence() {
        let mut renderer = NullRenderer::new();
        renderer.start().unwrap();
        renderer.open("http://127.0.0.1:1/?token=t").unwrap();
        renderer.resize(800, 600).unwrap();
        renderer.close().unwrap();

        assert!(renderer.started);
        assert_eq!(renderer.opened.as_deref(), Some("http://127.0.0.1:1/?token=t"));
        assert_eq!(renderer.size, Some((800, 600)));
        assert!(renderer.closed);
    }

    #[test]
    fn explicit_binary_is_accepted_without_probing() {
        let mut renderer = ProcessRenderer::new(RendererConfig {
            browser: Some(String::from("/nonexistent/browser-binary")),
            ..RendererConfig::default()
        });
        // start only records the binary; the spawn happens on open.
        renderer.start().unwrap();

        let err = renderer.open("http://127.0.0.1:1/").unwrap_err();
        assert!(matches!(err, RendererError::Launch(_)));
    }

    #[test]
    fn open_before_start_is_a_control_error() {
        let mut renderer = ProcessRenderer::new(RendererConfig::default());
        let err = renderer.open("http://127.0.0.1:1/").unwrap_err();
        assert!(matches!(err, RendererError::Control(_)));
    }

    #[test]
    fn resize_without_a_window_just_records_the_size() {
        let mut renderer = ProcessRenderer::new(RendererConfig::default());
        renderer.resize(640, 480).unwrap();
        assert_eq!(renderer.window, (640, 480));
    }
}
