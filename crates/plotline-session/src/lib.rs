//! Caller-facing chart sessions for Plotline.
//!
//! A [`Session`] bridges a synchronous caller to two independently
//! scheduled execution contexts: a background Tokio runtime driving the
//! persistent chart service, and a dedicated control thread driving the
//! renderer collaborator (the external browser surface). The session is
//! the single point that sequences cross-context calls; every
//! caller-visible operation is a bounded wait, so nothing can block
//! forever.
//!
//! # Example
//!
//! ```rust,ignore
//! use plotline_session::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default());
//! session.start()?;
//! session.with_figure(|figure| {
//!     let id = figure.new_plot();
//!     if let Some(plot) = figure.plot_mut(id) {
//!         plot.set_line_points(&[0.0, 1.0, 2.0], &[1.0, 4.0, 9.0]);
//!     }
//!     figure.set_title("Squares");
//! });
//! session.show(false)?;
//! session.save("squares.png")?;
//! session.stop()?;
//! ```
//!
//! Dropping a live session stops it best-effort, so the browser and the
//! socket are released on every exit path.

pub mod config;
pub mod control;
pub mod error;
pub mod renderer;
pub mod service;
pub mod session;

// Re-export primary types for convenience.
pub use config::SessionConfig;
pub use control::RendererHandle;
pub use error::SessionError;
pub use renderer::{NullRenderer, ProcessRenderer, Renderer, RendererConfig, RendererError};
pub use service::ServiceHandle;
pub use session::{Session, SessionPhase};
