//! Serializable wire representation of a figure.
//!
//! The field names and nesting here are a fixed contract with the
//! front-end chart renderer; changing them breaks remote clients. Most
//! names are camelCase, with two historical exceptions kept verbatim:
//! `line_height` inside the title block and the lowercase
//! `defaultxmin`/`defaultxmax` pair at the top level.

use serde::{Deserialize, Serialize};

/// The fully-resolved, serializable representation of a figure at a point
/// in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSnapshot {
    /// Datasets in render order.
    pub data: SnapshotData,
    /// Error slot. Empty on success; carries a sampling or update failure
    /// message so the client can display it without losing the last good
    /// chart.
    pub error: String,
    /// Global options, legend, title, and axis blocks.
    pub options: SnapshotOptions,
    /// Whether the figure has an interactive plot.
    pub interactive: bool,
    /// Current lower bound of the default X axis, if known.
    pub defaultxmin: Option<f64>,
    /// Current upper bound of the default X axis, if known.
    pub defaultxmax: Option<f64>,
}

/// Dataset container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    /// Datasets in render order; the interactive plot, when present, comes
    /// last.
    pub datasets: Vec<Dataset>,
}

/// Global chart options plus nested legend, title, and scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotOptions {
    /// Whether the client animates transitions.
    pub animation: bool,
    /// Whether the chart resizes with its container.
    pub responsive: bool,
    /// Global line-display default; per-dataset `showLine` overrides it.
    pub show_lines: bool,
    /// Whether the client preserves the canvas aspect ratio.
    pub maintain_aspect_ratio: bool,
    /// Tooltip behavior.
    pub tooltips: TooltipOptions,
    /// Legend block.
    pub legend: LegendData,
    /// Title block.
    pub title: TitleData,
    /// Axis blocks.
    pub scales: ScaleData,
}

/// Tooltip options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipOptions {
    /// Whether hover tooltips are shown.
    pub enabled: bool,
}

/// Legend wire data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendData {
    /// Whether the legend is shown.
    pub display: bool,
    /// Placement edge (`top`, `bottom`, `left`, `right`).
    pub position: String,
}

/// Title wire data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleData {
    /// Whether the title is shown.
    pub display: bool,
    /// The title text.
    pub text: String,
    /// Font size in points.
    pub font_size: f64,
    /// Font family stack.
    pub font_family: String,
    /// Font color.
    pub font_color: String,
    /// Font style (`bold`, `normal`, ...).
    pub font_style: String,
    /// Padding around the title in pixels.
    pub padding: f64,
    /// Line height multiplier.
    #[serde(rename = "line_height")]
    pub line_height: f64,
    /// Placement edge.
    pub position: String,
}

/// Axis container split by orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleData {
    /// Horizontal axes, default axis first.
    pub x_axes: Vec<AxisData>,
    /// Vertical axes, default axis first.
    pub y_axes: Vec<AxisData>,
}

/// One axis block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisData {
    /// The axis id datasets reference.
    pub id: String,
    /// Scale type; always `linear`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the axis is drawn.
    pub display: bool,
    /// Grid line colors.
    pub grid_lines: GridLineData,
    /// Tick bounds and step.
    pub ticks: TickData,
}

/// Grid line colors of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLineData {
    /// Color of ordinary grid lines.
    pub color: String,
    /// Color of the zero line.
    pub zero_line_color: String,
}

/// Tick bounds of one axis. All fields are absent until the axis has
/// derived or explicit bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickData {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Tick step size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<f64>,
}

/// One dataset in the fixed wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Display label shown in the legend.
    pub label: String,
    /// Whether the area under the line is filled.
    pub fill: bool,
    /// Line interpolation tension; 0 draws straight segments.
    pub tension: f64,
    /// Fill color under the line.
    pub background_color: String,
    /// Line color.
    pub border_color: String,
    /// Point fill color.
    pub point_background_color: String,
    /// Point outline color.
    pub point_border_color: String,
    /// Point outline width.
    pub point_border_width: f64,
    /// Point marker radius; 0 hides the markers.
    pub point_radius: f64,
    /// Marker radius while hovered.
    pub point_hover_radius: f64,
    /// Hit-test radius around each point.
    pub point_hit_radius: f64,
    /// Marker fill while hovered.
    pub point_hover_background_color: String,
    /// Marker outline while hovered.
    pub point_hover_border_color: String,
    /// Whether the connecting line is drawn.
    pub show_line: bool,
    /// Id of the X axis this dataset is plotted against.
    #[serde(rename = "xAxisID")]
    pub x_axis_id: String,
    /// Id of the Y axis this dataset is plotted against.
    #[serde(rename = "yAxisID")]
    pub y_axis_id: String,
    /// The point sequence.
    pub data: Vec<PointData>,
    /// Per-point label rendering.
    pub datalabels: DataLabelData,
}

/// One wire point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Optional label rendered beside the point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Per-point label rendering options of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLabelData {
    /// Whether per-point labels are drawn.
    pub display: bool,
    /// Label color.
    pub color: String,
    /// Label placement relative to the point.
    pub align: String,
    /// Label font, absent for the client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontData>,
}

/// Label font options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontData {
    /// Font size in points.
    pub size: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dataset_axis_references_use_the_historical_casing() {
        let dataset = Dataset {
            label: String::from("0"),
            fill: false,
            tension: 0.0,
            background_color: String::new(),
            border_color: String::new(),
            point_background_color: String::new(),
            point_border_color: String::new(),
            point_border_width: 1.0,
            point_radius: 4.0,
            point_hover_radius: 5.0,
            point_hit_radius: 3.0,
            point_hover_background_color: String::new(),
            point_hover_border_color: String::new(),
            show_line: false,
            x_axis_id: String::from("xax0"),
            y_axis_id: String::from("yax0"),
            data: vec![PointData {
                x: 1.0,
                y: 2.0,
                label: None,
            }],
            datalabels: DataLabelData {
                display: false,
                color: String::from("black"),
                align: String::from("right"),
                font: None,
            },
        };

        let value = serde_json::to_value(&dataset).unwrap();
        assert_eq!(value["xAxisID"], "xax0");
        assert_eq!(value["yAxisID"], "yax0");
        assert_eq!(value["pointRadius"], 4.0);
        assert_eq!(value["showLine"], false);
        // Unlabeled points serialize without a label key.
        assert!(value["data"][0].get("label").is_none());
    }

    #[test]
    fn tick_block_uses_step_size_casing() {
        let ticks = TickData {
            min: Some(0.0),
            max: Some(1.0),
            step_size: Some(0.1),
        };
        let value = serde_json::to_value(&ticks).unwrap();
        assert_eq!(value["stepSize"], 0.1);
    }
}
