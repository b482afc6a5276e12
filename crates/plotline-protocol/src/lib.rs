//! Update-protocol message types for Plotline.
//!
//! This crate is the transport-agnostic contract between the chart
//! service and the in-page client: message names, payload shapes, and the
//! connection identifier. It contains no I/O; ordering rules (one
//! outstanding render acknowledgement, one outstanding capture exchange)
//! are enforced by the session orchestrator, not here.
//!
//! Messages travel as JSON with a `type` tag and an optional `payload`,
//! for example:
//!
//! ```json
//! {"type": "get_function_update", "payload": {"code": "f(x, a) = a * x"}}
//! ```

pub mod ids;
pub mod messages;

// Re-export primary types for convenience.
pub use ids::ConnectionId;
pub use messages::{
    ClientMessage, FunctionUpdateReply, FunctionUpdateRequest, GraphUpdateRequest, ServerMessage,
};
