//! Chart service for Plotline sessions.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) carrying the bidirectional update
//!   protocol: snapshot pushes, interactive re-sampling, render
//!   acknowledgements, and image capture
//! - **Static-content endpoint** (`/`) serving the front-end assets
//!
//! # Architecture
//!
//! All connected clients share one [`ServiceState`]: the figure under a
//! lock, a broadcast channel for outbound messages, the connection
//! registry, and the three synchronization [`Gate`]s the session
//! orchestrator awaits (client attached, render acknowledged, image
//! received). Inbound protocol messages are dispatched on the service's
//! own runtime and never touch the renderer-control side.
//!
//! [`Gate`]: gate::Gate
//! [`ServiceState`]: state::ServiceState

pub mod error;
pub mod gate;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ServerError;
pub use gate::Gate;
pub use router::build_router;
pub use server::{ServerConfig, start_server};
pub use state::ServiceState;
