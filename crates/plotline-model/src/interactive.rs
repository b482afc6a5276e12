//! The function-backed interactive plot.
//!
//! An interactive plot produces its points by evaluating a user-supplied
//! function instead of having them set directly. The compiled function,
//! its control parameter names, and the evaluation cache are owned by the
//! plot itself; there is no process-wide current function.

use std::collections::BTreeMap;

use plotline_sample::{Domain, EvalCache, SampleError, SampleSeries, SampledFunction, adaptive_sample, compile};

use crate::axis::AxisId;
use crate::plot::Plot;

/// Dataset key reserved for the interactive plot.
pub(crate) const INTERACTIVE_KEY: &str = "interactive";

/// A plot whose points come from sampling a bound function.
#[derive(Debug, Clone)]
pub struct InteractivePlot {
    plot: Plot,
    function: Option<SampledFunction>,
    params: Vec<String>,
    cache: EvalCache,
}

impl InteractivePlot {
    pub(crate) fn new(x_axis: AxisId, y_axis: AxisId) -> Self {
        Self {
            plot: Plot::new(String::from(INTERACTIVE_KEY), x_axis, y_axis),
            function: None,
            params: Vec::new(),
            cache: EvalCache::new(),
        }
    }

    /// The underlying plot (points, style, axis references).
    pub fn plot(&self) -> &Plot {
        &self.plot
    }

    /// Mutable access to the underlying plot.
    pub fn plot_mut(&mut self) -> &mut Plot {
        &mut self.plot
    }

    /// The control parameter names of the bound function, in declaration
    /// order. Empty when no function is bound.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether a function is currently bound.
    pub fn has_function(&self) -> bool {
        self.function.is_some()
    }

    /// Compile `source` and bind the resulting function.
    ///
    /// On success the evaluation cache is dropped (old entries would
    /// answer for the wrong function) and the accepted parameter names are
    /// returned. On failure the previously bound function, its parameter
    /// list, and its cache are all left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Compile`] for malformed or invalid source.
    pub fn bind_function(&mut self, source: &str) -> Result<&[String], SampleError> {
        let function = compile(source)?;
        self.params = function.params().to_vec();
        self.function = Some(function);
        self.cache.clear();
        Ok(&self.params)
    }

    /// Sample the bound function over `domain` with the given parameter
    /// bindings. Returns `None` when no function is bound.
    ///
    /// # Errors
    ///
    /// Propagates sampling failures; the plot's points are untouched on
    /// error.
    pub(crate) fn sample(
        &mut self,
        params: &BTreeMap<String, f64>,
        domain: Domain,
    ) -> Result<Option<SampleSeries>, SampleError> {
        match &self.function {
            Some(function) => adaptive_sample(function, &mut self.cache, params, domain).map(Some),
            None => Ok(None),
        }
    }
}
