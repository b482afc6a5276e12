//! Error types for the session orchestrator.
//!
//! The taxonomy mirrors how failures affect the session: startup failures
//! are fatal and fully unwound, protocol timeouts leave the session
//! usable, and shutdown reports an aggregate failure only when one of its
//! always-executed cleanup steps failed.

use std::time::Duration;

use plotline_model::ModelError;

use crate::renderer::RendererError;

/// Errors that can occur during session operation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The service or the renderer could not be brought up, or no client
    /// attached within the startup window. Fatal to the session; all
    /// partially acquired resources have been unwound.
    #[error("startup failure: {0}")]
    Startup(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The remote surface never confirmed a pushed snapshot.
    #[error("render was not acknowledged within {waited:?}")]
    RenderTimeout {
        /// How long the render-acknowledgement gate was awaited.
        waited: Duration,
    },

    /// The capture response never arrived; no file was written.
    #[error("image data did not arrive within {waited:?}")]
    SaveTimeout {
        /// How long the image-received gate was awaited.
        waited: Duration,
    },

    /// An operation was requested while the session is not running.
    #[error("session is not running")]
    NotRunning,

    /// A cross-context call failed or the service runtime is gone.
    #[error("service fault: {0}")]
    Service(String),

    /// A chart model mutation was rejected.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The renderer collaborator failed.
    #[error("renderer error: {0}")]
    Renderer(#[from] RendererError),

    /// A filesystem operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more shutdown steps failed. Every step still ran.
    #[error("shutdown completed with failures: {}", .failures.join("; "))]
    ShutdownPartial {
        /// One message per failed cleanup step.
        failures: Vec<String>,
    },
}
