//! Axis identity, bounds, and auto-bound derivation.
//!
//! An axis can be shared by several plots. Each contributing plot reports
//! the extent of its data, and the axis derives its display bounds as the
//! union of those extents expanded by a 10% margin on each side. Explicit
//! bounds set by the caller pin the axis and suspend auto derivation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Stable identifier for an axis within one figure.
///
/// The string form (`xax0`, `yax1`, ...) is what datasets reference on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AxisId(String);

impl AxisId {
    pub(crate) fn new(horizontal: bool, index: usize) -> Self {
        let prefix = if horizontal { "x" } else { "y" };
        Self(format!("{prefix}ax{index}"))
    }

    /// The identifier as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current display bounds of an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    /// Lower edge of the displayed range.
    pub min: f64,
    /// Upper edge of the displayed range.
    pub max: f64,
    /// Tick step size.
    pub step: f64,
}

/// Observed data extent of one contributing plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extent {
    pub(crate) min: f64,
    pub(crate) max: f64,
}

/// One axis of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    id: AxisId,
    horizontal: bool,
    bounds: Option<AxisBounds>,
    explicit: bool,
    extents: BTreeMap<String, Extent>,
}

impl Axis {
    pub(crate) fn new(horizontal: bool, index: usize) -> Self {
        Self {
            id: AxisId::new(horizontal, index),
            horizontal,
            bounds: None,
            explicit: false,
            extents: BTreeMap::new(),
        }
    }

    /// The axis identifier.
    pub fn id(&self) -> &AxisId {
        &self.id
    }

    /// Whether this is an X axis.
    pub fn is_horizontal(&self) -> bool {
        self.horizontal
    }

    /// The current display bounds, if any have been derived or set.
    pub fn bounds(&self) -> Option<AxisBounds> {
        self.bounds
    }

    /// Set explicit display bounds, suspending auto derivation.
    ///
    /// When `step` is omitted it defaults to a twelfth of the range,
    /// rounded to two significant figures.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRange`] if `min >= max`; the previous
    /// bounds are left untouched.
    pub fn set_bounds(&mut self, min: f64, max: f64, step: Option<f64>) -> Result<(), ModelError> {
        if !(min < max) {
            return Err(ModelError::InvalidRange { min, max });
        }
        self.install(min, max, step);
        self.explicit = true;
        Ok(())
    }

    /// Resume auto-derived bounds on the next refresh.
    pub fn use_auto_bounds(&mut self) {
        self.explicit = false;
    }

    pub(crate) fn clear_extents(&mut self) {
        self.extents.clear();
    }

    pub(crate) fn record_extent(&mut self, key: &str, min: f64, max: f64) {
        self.extents.insert(key.to_owned(), Extent { min, max });
    }

    /// Recompute auto bounds from the recorded extents. A no-op when the
    /// axis has explicit bounds or no contributing plots. The result is a
    /// min/max reduction over the extent map, independent of the order
    /// plots were added.
    pub(crate) fn refresh_auto_bounds(&mut self) {
        if self.explicit || self.extents.is_empty() {
            return;
        }
        let data_min = self
            .extents
            .values()
            .map(|e| e.min)
            .fold(f64::INFINITY, f64::min);
        let data_max = self
            .extents
            .values()
            .map(|e| e.max)
            .fold(f64::NEG_INFINITY, f64::max);
        let spread = data_max - data_min;
        // A single-valued extent still needs a visible range.
        let margin = if spread > 0.0 { spread * 0.1 } else { 0.5 };
        self.install(data_min - margin, data_max + margin, None);
    }

    fn install(&mut self, min: f64, max: f64, step: Option<f64>) {
        let step = step.unwrap_or_else(|| round_to_sig((max - min) / 12.0, 2));
        self.bounds = Some(AxisBounds { min, max, step });
    }
}

/// Round `value` to `digits` significant figures.
fn round_to_sig(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn id_strings_follow_the_wire_scheme() {
        assert_eq!(AxisId::new(true, 0).as_str(), "xax0");
        assert_eq!(AxisId::new(false, 2).as_str(), "yax2");
    }

    #[test]
    fn invalid_range_is_rejected_and_leaves_bounds_unchanged() {
        let mut axis = Axis::new(false, 0);
        axis.set_bounds(0.0, 10.0, None).unwrap();
        let before = axis.bounds().unwrap();

        let err = axis.set_bounds(5.0, 5.0, None).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRange { .. }));
        let err = axis.set_bounds(7.0, 2.0, None).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRange { .. }));

        assert_eq!(axis.bounds().unwrap(), before);
    }

    #[test]
    fn default_step_is_a_twelfth_rounded_to_two_figures() {
        let mut axis = Axis::new(true, 0);
        axis.set_bounds(0.0, 10.0, None).unwrap();
        // 10 / 12 = 0.8333... -> 0.83
        assert!((axis.bounds().unwrap().step - 0.83).abs() < 1e-12);

        axis.set_bounds(0.0, 120.0, None).unwrap();
        assert_eq!(axis.bounds().unwrap().step, 10.0);

        axis.set_bounds(0.0, 1.0, Some(0.25)).unwrap();
        assert_eq!(axis.bounds().unwrap().step, 0.25);
    }

    #[test]
    fn auto_bounds_are_the_union_extent_with_margin() {
        let mut axis = Axis::new(false, 0);
        axis.record_extent("0", 2.0, 7.0);
        axis.record_extent("1", 1.0, 6.0);
        axis.refresh_auto_bounds();

        let bounds = axis.bounds().unwrap();
        // Union [1, 7], spread 6, margin 0.6.
        assert!((bounds.min - 0.4).abs() < 1e-12);
        assert!((bounds.max - 7.6).abs() < 1e-12);
    }

    #[test]
    fn auto_bounds_ignore_insertion_order() {
        let mut forward = Axis::new(false, 0);
        forward.record_extent("0", 2.0, 7.0);
        forward.record_extent("1", 1.0, 6.0);
        forward.refresh_auto_bounds();

        let mut reverse = Axis::new(false, 0);
        reverse.record_extent("1", 1.0, 6.0);
        reverse.record_extent("0", 2.0, 7.0);
        reverse.refresh_auto_bounds();

        assert_eq!(forward.bounds(), reverse.bounds());
    }

    #[test]
    fn explicit_bounds_suspend_auto_derivation() {
        let mut axis = Axis::new(false, 0);
        axis.set_bounds(-1.0, 1.0, None).unwrap();
        axis.record_extent("0", 100.0, 200.0);
        axis.refresh_auto_bounds();
        assert_eq!(axis.bounds().unwrap().min, -1.0);

        axis.use_auto_bounds();
        axis.refresh_auto_bounds();
        assert!(axis.bounds().unwrap().min > 1.0);
    }

    #[test]
    fn single_valued_extent_still_produces_a_range() {
        let mut axis = Axis::new(false, 0);
        axis.record_extent("0", 3.0, 3.0);
        axis.refresh_auto_bounds();

        let bounds = axis.bounds().unwrap();
        assert!(bounds.min < bounds.max);
    }

    #[test]
    fn rounding_to_significant_figures() {
        assert_eq!(round_to_sig(0.8333, 2), 0.83);
        assert_eq!(round_to_sig(1234.0, 2), 1200.0);
        assert_eq!(round_to_sig(-0.0475, 2), -0.048);
        assert_eq!(round_to_sig(0.0, 2), 0.0);
    }
}
