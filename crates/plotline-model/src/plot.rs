//! A single plot: an ordered point sequence plus style attributes.
//!
//! Plots reference their axes by id rather than owning them, so one axis
//! can serve several plots. Point mutation records the plot's observed
//! data extent, which the figure feeds into axis auto-bound derivation at
//! snapshot time.

use crate::axis::AxisId;
use crate::snapshot::{DataLabelData, Dataset, FontData, PointData};

/// Identifier of a plot within one figure, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlotId(pub(crate) usize);

impl std::fmt::Display for PlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One data point, optionally carrying a per-point label.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Optional label rendered beside the point.
    pub label: Option<String>,
}

/// Style attributes of a plot, in the fixed shape the front-end expects.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub(crate) fill: bool,
    pub(crate) tension: f64,
    pub(crate) background_color: String,
    pub(crate) border_color: String,
    pub(crate) point_background_color: String,
    pub(crate) point_border_color: String,
    pub(crate) point_border_width: f64,
    pub(crate) point_radius: f64,
    pub(crate) point_hover_radius: f64,
    pub(crate) point_hit_radius: f64,
    pub(crate) point_hover_background_color: String,
    pub(crate) point_hover_border_color: String,
    pub(crate) show_line: bool,
    pub(crate) labels_displayed: bool,
    pub(crate) label_color: String,
    pub(crate) label_size: Option<f64>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            fill: false,
            tension: 0.0,
            background_color: String::from("rgba(255, 255, 255, 0)"),
            border_color: String::from("#000"),
            point_background_color: String::from("rgba(0,0,0,1)"),
            point_border_color: String::from("rgba(0,0,0,1)"),
            point_border_width: 1.0,
            point_radius: 4.0,
            point_hover_radius: 5.0,
            point_hit_radius: 3.0,
            point_hover_background_color: String::from("#000"),
            point_hover_border_color: String::from("rgba(220,220,220,1)"),
            show_line: false,
            labels_displayed: false,
            label_color: String::from("black"),
            label_size: None,
        }
    }
}

/// A plot inside a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    key: String,
    label: String,
    x_axis: AxisId,
    y_axis: AxisId,
    points: Vec<Point>,
    style: PlotStyle,
    x_extent: Option<(f64, f64)>,
    y_extent: Option<(f64, f64)>,
}

impl Plot {
    pub(crate) fn new(key: String, x_axis: AxisId, y_axis: AxisId) -> Self {
        let label = key.clone();
        Self {
            key,
            label,
            x_axis,
            y_axis,
            points: Vec::new(),
            style: PlotStyle::default(),
            x_extent: None,
            y_extent: None,
        }
    }

    /// The stable dataset key of this plot.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The display label. Defaults to the dataset key.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Set the display label shown in the legend.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// The X axis this plot contributes to.
    pub fn x_axis(&self) -> &AxisId {
        &self.x_axis
    }

    /// The Y axis this plot contributes to.
    pub fn y_axis(&self) -> &AxisId {
        &self.y_axis
    }

    /// Re-bind the plot to another X axis.
    pub fn set_x_axis(&mut self, axis: AxisId) {
        self.x_axis = axis;
    }

    /// Re-bind the plot to another Y axis.
    pub fn set_y_axis(&mut self, axis: AxisId) {
        self.y_axis = axis;
    }

    /// The current point sequence.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Replace the point sequence in scatter mode (visible point markers,
    /// no connecting line). Pairs are taken up to the shorter input; any
    /// per-point labels from a previous call are dropped.
    pub fn set_points(&mut self, xs: &[f64], ys: &[f64]) {
        self.points = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| Point { x, y, label: None })
            .collect();
        self.style.show_line = false;
        self.style.point_radius = 4.0;
        self.refresh_extents();
    }

    /// Replace the point sequence in line mode (connecting line, hidden
    /// point markers).
    pub fn set_line_points(&mut self, xs: &[f64], ys: &[f64]) {
        self.set_points(xs, ys);
        self.style.show_line = true;
        self.style.point_radius = 0.0;
    }

    /// Drop all points, leaving mode and style untouched.
    pub fn clear_points(&mut self) {
        self.points.clear();
        self.x_extent = None;
        self.y_extent = None;
    }

    /// Attach per-point labels to the current points, pairing up to the
    /// shorter of the two sequences, and turn label display on.
    pub fn set_labels(&mut self, labels: &[String]) {
        for (point, label) in self.points.iter_mut().zip(labels) {
            point.label = Some(label.clone());
        }
        self.style.labels_displayed = true;
    }

    /// Set the color and optional font size of per-point labels.
    pub fn set_label_style(&mut self, color: impl Into<String>, size: Option<f64>) {
        self.style.label_color = color.into();
        self.style.label_size = size;
    }

    /// Show the connecting line and hide point markers.
    pub fn set_line_mode(&mut self) {
        self.style.show_line = true;
        self.style.point_radius = 0.0;
    }

    /// Hide the connecting line and show point markers.
    pub fn set_scatter_mode(&mut self) {
        self.style.show_line = false;
        self.style.point_radius = 4.0;
    }

    /// Set the line color (also used for the point hover highlight).
    pub fn set_line_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        self.style.point_hover_background_color = color.clone();
        self.style.border_color = color;
    }

    /// Set the point fill color.
    pub fn set_point_color(&mut self, color: impl Into<String>) {
        self.style.point_background_color = color.into();
    }

    /// Set the point marker radius.
    pub fn set_point_size(&mut self, radius: f64) {
        self.style.point_radius = radius;
    }

    /// Observed x extent of the current points, if any.
    pub(crate) fn x_extent(&self) -> Option<(f64, f64)> {
        self.x_extent
    }

    /// Observed y extent of the current points, if any.
    pub(crate) fn y_extent(&self) -> Option<(f64, f64)> {
        self.y_extent
    }

    fn refresh_extents(&mut self) {
        if self.points.is_empty() {
            self.x_extent = None;
            self.y_extent = None;
            return;
        }
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for point in &self.points {
            x_min = x_min.min(point.x);
            x_max = x_max.max(point.x);
            y_min = y_min.min(point.y);
            y_max = y_max.max(point.y);
        }
        self.x_extent = Some((x_min, x_max));
        self.y_extent = Some((y_min, y_max));
    }

    /// Render this plot as a wire dataset.
    pub(crate) fn dataset(&self) -> Dataset {
        let style = &self.style;
        Dataset {
            label: self.label.clone(),
            fill: style.fill,
            tension: style.tension,
            background_color: style.background_color.clone(),
            border_color: style.border_color.clone(),
            point_background_color: style.point_background_color.clone(),
            point_border_color: style.point_border_color.clone(),
            point_border_width: style.point_border_width,
            point_radius: style.point_radius,
            point_hover_radius: style.point_hover_radius,
            point_hit_radius: style.point_hit_radius,
            point_hover_background_color: style.point_hover_background_color.clone(),
            point_hover_border_color: style.point_hover_border_color.clone(),
            show_line: style.show_line,
            x_axis_id: self.x_axis.as_str().to_owned(),
            y_axis_id: self.y_axis.as_str().to_owned(),
            data: self
                .points
                .iter()
                .map(|p| PointData {
                    x: p.x,
                    y: p.y,
                    label: p.label.clone(),
                })
                .collect(),
            datalabels: DataLabelData {
                display: style.labels_displayed,
                color: style.label_color.clone(),
                align: String::from("right"),
                font: style.label_size.map(|size| FontData { size }),
            },
        }
    }
}
