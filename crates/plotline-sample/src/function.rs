//! The compile boundary for user-supplied function text.
//!
//! Remote clients send function definitions as plain text. [`compile`]
//! turns that text into a [`SampledFunction`] or a structured
//! [`SampleError::Compile`], and the result of a successful compile is the
//! only thing the rest of the system ever executes. Malformed input can
//! never crash the service; the expression grammar is closed, so the
//! compiled function cannot reach the host either.

use std::collections::BTreeMap;

use crate::error::SampleError;
use crate::expr::{Definition, Expr, NameUse, UnaryFn, constant, parse_definition};

/// The name of the sampling variable. The first formal parameter of every
/// accepted definition must use it.
pub const SAMPLING_VARIABLE: &str = "x";

/// A compiled, validated user function.
///
/// Evaluation is pure: the same `(x, parameters)` tuple always yields the
/// same value, which is what makes the evaluation cache sound.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    name: String,
    params: Vec<String>,
    body: Expr,
}

/// Compile function source text of the form `f(x, a, b) = expr`.
///
/// Validation rules:
/// - the first formal parameter must be the sampling variable `x`;
/// - formal parameter names must be distinct;
/// - every identifier in the body must be a formal parameter or one of the
///   constants `pi` and `e`;
/// - every call must name a known unary function.
///
/// # Errors
///
/// Returns [`SampleError::Compile`] with a human-readable message on any
/// parse or validation failure. Never panics on malformed text.
pub fn compile(source: &str) -> Result<SampledFunction, SampleError> {
    let Definition { name, params, body } =
        parse_definition(source).map_err(SampleError::Compile)?;

    match params.first() {
        Some(first) if first == SAMPLING_VARIABLE => {}
        Some(first) => {
            return Err(SampleError::Compile(format!(
                "the first parameter of `{name}` must be the sampling variable \
                 `{SAMPLING_VARIABLE}`, found `{first}`"
            )));
        }
        None => {
            return Err(SampleError::Compile(format!(
                "`{name}` must take the sampling variable `{SAMPLING_VARIABLE}` \
                 as its first parameter"
            )));
        }
    }

    for (i, param) in params.iter().enumerate() {
        if params[..i].contains(param) {
            return Err(SampleError::Compile(format!(
                "duplicate parameter `{param}` in `{name}`"
            )));
        }
    }

    let mut violation: Option<String> = None;
    body.visit_names(&mut |use_| match use_ {
        NameUse::Variable(var) => {
            let known = params.iter().any(|p| p == var) || constant(var).is_some();
            if !known && violation.is_none() {
                violation = Some(format!("unknown variable `{var}` in the body of `{name}`"));
            }
        }
        NameUse::Function(func) => {
            if UnaryFn::from_name(func).is_none() && violation.is_none() {
                violation = Some(format!("unknown function `{func}` in the body of `{name}`"));
            }
        }
    });
    if let Some(message) = violation {
        return Err(SampleError::Compile(message));
    }

    let params = params.into_iter().skip(1).collect();
    Ok(SampledFunction { name, params, body })
}

impl SampledFunction {
    /// The function name from the definition.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interactive control parameters, in declaration order. The
    /// sampling variable is not included.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Evaluate the function at `x` with the given parameter bindings.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Runtime`] if a control parameter has no
    /// binding. Non-finite results are not errors; NaN and infinities flow
    /// through as floats.
    pub fn eval(&self, x: f64, params: &BTreeMap<String, f64>) -> Result<f64, SampleError> {
        let lookup = move |var: &str| {
            if var == SAMPLING_VARIABLE {
                Some(x)
            } else {
                params.get(var).copied()
            }
        };
        self.body.eval(&lookup)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_control_parameters_in_order() {
        let f = compile("f(x, a, b) = a * x + b").unwrap();
        assert_eq!(f.name(), "f");
        assert_eq!(f.params(), ["a", "b"]);
    }

    #[test]
    fn accepts_function_of_x_alone() {
        let f = compile("g(x) = x ^ 2").unwrap();
        assert!(f.params().is_empty());

        let y = f.eval(3.0, &BTreeMap::new()).unwrap();
        assert_eq!(y, 9.0);
    }

    #[test]
    fn rejects_wrong_sampling_variable() {
        let err = compile("f(y, a) = a * y").unwrap_err();
        match err {
            SampleError::Compile(msg) => {
                assert!(msg.contains('x'), "message should name the sampling variable: {msg}");
            }
            SampleError::Runtime(_) => panic!("expected a compile error"),
        }
    }

    #[test]
    fn rejects_duplicate_parameters() {
        assert!(compile("f(x, a, a) = a * x").is_err());
    }

    #[test]
    fn rejects_unknown_body_names() {
        assert!(compile("f(x, a) = a * x + c").is_err());
        assert!(compile("f(x) = frobnicate(x)").is_err());
    }

    #[test]
    fn rejects_malformed_source() {
        assert!(compile("").is_err());
        assert!(compile("f(x) =").is_err());
        assert!(compile("import os").is_err());
    }

    #[test]
    fn missing_binding_is_a_runtime_error() {
        let f = compile("f(x, a) = a * x").unwrap();
        let err = f.eval(1.0, &BTreeMap::new()).unwrap_err();
        match err {
            SampleError::Runtime(msg) => assert!(msg.contains('a')),
            SampleError::Compile(_) => panic!("expected a runtime error"),
        }
    }

    #[test]
    fn evaluates_with_bindings() {
        let f = compile("f(x, amp, phase) = amp * sin(x + phase)").unwrap();
        let mut params = BTreeMap::new();
        params.insert(String::from("amp"), 2.0);
        params.insert(String::from("phase"), 0.0);

        let y = f.eval(std::f64::consts::FRAC_PI_2, &params).unwrap();
        assert!((y - 2.0).abs() < 1e-12);
    }
}
