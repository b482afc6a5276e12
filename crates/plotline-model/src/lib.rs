//! Chart model for Plotline: figures, plots, axes, and snapshots.
//!
//! The model is pure data with no concurrency of its own. A caller builds
//! a [`Figure`], attaches plots and axes through accessor methods, and asks
//! for a [`FigureSnapshot`] when the current state should go out over the
//! wire. Snapshotting refreshes derived axis bounds and nothing else.
//!
//! # Modules
//!
//! - [`axis`] -- axis identity, explicit bounds, and auto-bound derivation
//!   from contributing plot extents.
//! - [`plot`] -- an ordered point sequence plus style attributes,
//!   referencing its axes by id.
//! - [`interactive`] -- the one optional function-backed plot per figure.
//! - [`figure`] -- the aggregate: plots, axes, legend, title, options.
//! - [`snapshot`] -- the serializable wire representation.

pub mod axis;
pub mod error;
pub mod figure;
pub mod interactive;
pub mod plot;
pub mod snapshot;

// Re-export primary types for convenience.
pub use axis::{Axis, AxisBounds, AxisId};
pub use error::ModelError;
pub use figure::{Figure, Legend, Title};
pub use interactive::InteractivePlot;
pub use plot::{Plot, PlotId};
pub use snapshot::FigureSnapshot;
