//! Error types for chart model mutation.

use plotline_sample::SampleError;

/// Errors that can occur while mutating or updating the chart model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// An explicit axis range with `min >= max` was requested. The request
    /// is rejected before any state changes.
    #[error("invalid axis range: min {min} is not less than max {max}")]
    InvalidRange {
        /// The requested lower bound.
        min: f64,
        /// The requested upper bound.
        max: f64,
    },

    /// A second interactive plot was requested for a figure that already
    /// has one.
    #[error("figure already has an interactive plot")]
    InteractiveExists,

    /// Compiling or sampling the interactive function failed.
    #[error(transparent)]
    Sample(#[from] SampleError),
}
