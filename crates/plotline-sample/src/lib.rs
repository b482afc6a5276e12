//! Adaptive sampling engine and user-function compiler for Plotline.
//!
//! This crate turns user-supplied function text into a callable and then
//! into a point sequence dense enough to render a visually smooth curve,
//! without evaluating the function on a uniformly fine grid everywhere.
//!
//! # Modules
//!
//! - [`function`] -- the compile boundary: parse `f(x, a, b) = expr` source
//!   into a [`SampledFunction`] or a structured error. User text is never
//!   executed as code; it is compiled into a closed expression tree.
//! - [`cache`] -- bounded memoization of exact evaluation argument tuples,
//!   reused across refinement iterations and repeated update requests.
//! - [`engine`] -- gradient-driven iterative refinement producing the final
//!   x/y sequences.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use plotline_sample::{adaptive_sample, compile, Domain, EvalCache};
//!
//! let f = compile("f(x, a) = a * x * x").unwrap();
//! assert_eq!(f.params(), ["a"]);
//!
//! let mut cache = EvalCache::new();
//! let mut params = BTreeMap::new();
//! params.insert(String::from("a"), 1.0);
//!
//! let series = adaptive_sample(&f, &mut cache, &params, Domain::new(-10.0, 10.0)).unwrap();
//! assert_eq!(series.xs.len(), series.ys.len());
//! ```

pub mod cache;
pub mod engine;
pub mod error;
mod expr;
pub mod function;

// Re-export primary types for convenience.
pub use cache::{EVAL_CACHE_CAPACITY, EvalCache};
pub use engine::{Domain, INC_TOL, STEP_COUNT_INIT, SampleSeries, adaptive_sample};
pub use error::SampleError;
pub use function::{SampledFunction, compile};
