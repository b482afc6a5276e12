//! Error types for function compilation and sampling.
//!
//! Both variants carry human-readable messages that travel back to remote
//! clients as structured error payloads, so they must never contain
//! internal state beyond what the user's own input produced.

/// Errors that can occur while compiling or sampling a user function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// The function source text failed to parse or validate.
    #[error("compile error: {0}")]
    Compile(String),

    /// The function failed while being evaluated.
    #[error("evaluation error: {0}")]
    Runtime(String),
}
