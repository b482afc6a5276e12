//! Error types for the chart service.

/// Errors that can occur while starting or running the chart service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// A capture response carried an undecodable image payload.
    #[error("image payload error: {0}")]
    ImagePayload(String),
}
