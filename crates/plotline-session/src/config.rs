//! Session configuration.
//!
//! Defaults match a local single-user setup. Every field can be
//! overridden from the environment, which is how the demo binary and
//! integration scripts tune timeouts without recompiling.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SessionError;

/// Complete session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host address the chart service binds to.
    pub host: String,
    /// TCP port of the chart service. Port 0 picks an ephemeral port.
    pub port: u16,
    /// Directory holding the front-end assets.
    pub assets_dir: PathBuf,
    /// How long `show` waits for the render acknowledgement.
    pub render_timeout: Duration,
    /// How long `save` waits for the capture response.
    pub save_timeout: Duration,
    /// How long startup waits for the first client to attach. First load
    /// of a full browser and front-end pair is slow, so this is the
    /// longest of the timeouts.
    pub connect_timeout: Duration,
    /// How long shutdown waits for clients to disconnect and the service
    /// to drain.
    pub disconnect_timeout: Duration,
    /// How long each renderer control command may take.
    pub renderer_timeout: Duration,
    /// Launch the browser headless.
    pub headless: bool,
    /// Explicit browser binary; when absent the PATH is searched for a
    /// Chromium-family browser.
    pub browser: Option<String>,
    /// Render at a doubled device scale factor for crisp captures on
    /// high-density displays.
    pub hidpi: bool,
    /// Initial browser window size in pixels.
    pub window: (u32, u32),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 15555,
            assets_dir: PathBuf::from("build"),
            render_timeout: Duration::from_secs(5),
            save_timeout: Duration::from_secs(7),
            connect_timeout: Duration::from_secs(10),
            disconnect_timeout: Duration::from_secs(4),
            renderer_timeout: Duration::from_secs(10),
            headless: false,
            browser: None,
            hidpi: true,
            window: (1280, 800),
        }
    }
}

impl SessionConfig {
    /// Load configuration from the environment, starting from defaults.
    ///
    /// Recognized variables:
    /// - `PLOTLINE_HOST` -- bind address
    /// - `PLOTLINE_PORT` -- service port
    /// - `PLOTLINE_ASSETS_DIR` -- front-end asset directory
    /// - `PLOTLINE_RENDER_TIMEOUT_MS` -- render acknowledgement deadline
    /// - `PLOTLINE_SAVE_TIMEOUT_MS` -- capture deadline
    /// - `PLOTLINE_CONNECT_TIMEOUT_MS` -- startup client-attach deadline
    /// - `PLOTLINE_DISCONNECT_TIMEOUT_MS` -- shutdown drain deadline
    /// - `PLOTLINE_HEADLESS` -- `true` to launch the browser headless
    /// - `PLOTLINE_BROWSER` -- explicit browser binary
    /// - `PLOTLINE_HIDPI` -- `false` to disable the doubled scale factor
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if a set variable fails to parse.
    pub fn from_env() -> Result<Self, SessionError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("PLOTLINE_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_env("PLOTLINE_PORT")? {
            config.port = port;
        }
        if let Ok(dir) = std::env::var("PLOTLINE_ASSETS_DIR") {
            config.assets_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_env("PLOTLINE_RENDER_TIMEOUT_MS")? {
            config.render_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env("PLOTLINE_SAVE_TIMEOUT_MS")? {
            config.save_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env("PLOTLINE_CONNECT_TIMEOUT_MS")? {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env("PLOTLINE_DISCONNECT_TIMEOUT_MS")? {
            config.disconnect_timeout = Duration::from_millis(ms);
        }
        if let Some(headless) = parse_env("PLOTLINE_HEADLESS")? {
            config.headless = headless;
        }
        if let Ok(browser) = std::env::var("PLOTLINE_BROWSER") {
            config.browser = Some(browser);
        }
        if let Some(hidpi) = parse_env("PLOTLINE_HIDPI")? {
            config.hidpi = hidpi;
        }

        Ok(config)
    }
}

/// Parse an optional environment variable, erroring only when it is set
/// but unparseable.
fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, SessionError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| SessionError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
