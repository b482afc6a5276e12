//! Gradient-driven adaptive sampling.
//!
//! The engine starts from a uniform grid and iteratively refines the
//! regions where the curve moves fastest, so steep features get dense
//! sampling while flat stretches keep the coarse grid. The refinement
//! loop is capped at three passes; a near-discontinuity can therefore
//! remain under-sampled, which is an accepted approximation that bounds
//! the worst-case cost for pathological functions.

use std::collections::BTreeMap;

use crate::cache::EvalCache;
use crate::error::SampleError;
use crate::function::SampledFunction;

/// Number of uniform steps in the initial grid (the grid itself has one
/// more point, fencepost-style).
pub const STEP_COUNT_INIT: usize = 275;

/// Width, in samples, of the dilation applied around each steep index.
/// Must stay even; half of it is used on each side.
pub const INC_TOL: usize = 20;

/// Hard cap on refinement passes.
const REFINE_MAX_PASSES: usize = 3;

/// Divisor applied to the y spread to obtain the per-pass smoothness
/// threshold: adjacent samples further apart than `spread / 120` mark
/// their index as steep.
const SMOOTHNESS_DIVISOR: f64 = 120.0;

/// The x interval to sample over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    /// Lower edge of the interval.
    pub min: f64,
    /// Upper edge of the interval.
    pub max: f64,
}

impl Domain {
    /// Create a domain from its edges.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// The output of one sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    /// Sampled x positions, in ascending construction order.
    pub xs: Vec<f64>,
    /// Function values corresponding to `xs`.
    pub ys: Vec<f64>,
    /// How many refinement passes ran before the loop exited.
    pub refinements: usize,
    /// True when the loop exited because no index was steep; false when it
    /// stopped at the pass cap with steep regions remaining.
    pub converged: bool,
}

/// Sample `function` over `domain` with the given parameter bindings.
///
/// Starts from [`STEP_COUNT_INIT`] uniform steps, then repeatedly replaces
/// every sample in a steep region (dilated by [`INC_TOL`]`/2` on each
/// side) with three samples at a third of its local step size, until no
/// index is steep or the pass cap is reached.
///
/// Evaluations go through `cache`, so repeated positions across passes and
/// across calls with identical arguments are computed once.
///
/// # Errors
///
/// Returns [`SampleError::Runtime`] if the domain is empty or inverted, and
/// propagates any evaluation failure immediately: a partial curve would be
/// misleading, so a single failed evaluation fails the whole run.
pub fn adaptive_sample(
    function: &SampledFunction,
    cache: &mut EvalCache,
    params: &BTreeMap<String, f64>,
    domain: Domain,
) -> Result<SampleSeries, SampleError> {
    if !(domain.min < domain.max) {
        return Err(SampleError::Runtime(format!(
            "empty sampling domain: [{}, {}]",
            domain.min, domain.max
        )));
    }

    let step = (domain.max - domain.min) / STEP_COUNT_INIT as f64;
    let mut xs: Vec<f64> = (0..=STEP_COUNT_INIT)
        .map(|i| domain.min + step * i as f64)
        .collect();
    let mut steps = vec![step; xs.len()];
    let param_bits: Vec<u64> = params.values().map(|v| v.to_bits()).collect();

    let mut passes = 0;
    loop {
        let mut ys = Vec::with_capacity(xs.len());
        for &x in &xs {
            ys.push(eval_cached(function, cache, params, &param_bits, x)?);
        }

        let marks = steep_marks(&ys);
        let any_steep = marks.iter().any(|&m| m);
        if passes >= REFINE_MAX_PASSES || !any_steep {
            return Ok(SampleSeries {
                xs,
                ys,
                refinements: passes,
                converged: !any_steep,
            });
        }

        let marks = dilate(&marks, INC_TOL / 2);
        let mut new_xs = Vec::with_capacity(xs.len() * 2);
        let mut new_steps = Vec::with_capacity(xs.len() * 2);
        for (i, &x) in xs.iter().enumerate() {
            let s = steps[i];
            if marks[i] {
                let fine = s / 3.0;
                new_xs.extend_from_slice(&[x - fine, x, x + fine]);
                new_steps.extend_from_slice(&[fine, fine, fine]);
            } else {
                new_xs.push(x);
                new_steps.push(s);
            }
        }
        xs = new_xs;
        steps = new_steps;
        passes += 1;
    }
}

fn eval_cached(
    function: &SampledFunction,
    cache: &mut EvalCache,
    params: &BTreeMap<String, f64>,
    param_bits: &[u64],
    x: f64,
) -> Result<f64, SampleError> {
    if let Some(y) = cache.get(x, param_bits) {
        return Ok(y);
    }
    let y = function.eval(x, params)?;
    cache.insert(x, param_bits, y);
    Ok(y)
}

/// Discrete gradient of `ys` over the sample index: central differences in
/// the interior, one-sided at the edges.
fn gradient(ys: &[f64]) -> Vec<f64> {
    let n = ys.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let mut g = Vec::with_capacity(n);
            g.push(ys[1] - ys[0]);
            for i in 1..n - 1 {
                g.push((ys[i + 1] - ys[i - 1]) / 2.0);
            }
            g.push(ys[n - 1] - ys[n - 2]);
            g
        }
    }
}

/// Mark every index whose gradient magnitude exceeds the smoothness
/// threshold. A constant sequence has zero spread and therefore a zero
/// threshold, and the strict comparison keeps every index unmarked.
fn steep_marks(ys: &[f64]) -> Vec<bool> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &y in ys {
        lo = lo.min(y);
        hi = hi.max(y);
    }
    let max_allowed_dy = (hi - lo) / SMOOTHNESS_DIVISOR;

    gradient(ys)
        .iter()
        .map(|g| g.abs() > max_allowed_dy)
        .collect()
}

/// Expand each marked index to cover `radius` neighbors on both sides, so
/// refinement does not leave visible kinks right next to a steep region.
fn dilate(marks: &[bool], radius: usize) -> Vec<bool> {
    let n = marks.len();
    let mut out = vec![false; n];
    for (i, &marked) in marks.iter().enumerate() {
        if marked {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(n - 1);
            for slot in &mut out[lo..=hi] {
                *slot = true;
            }
        }
    }
    out
}
