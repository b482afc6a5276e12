//! The figure aggregate: plots, axes, legend, title, and options.

use std::collections::BTreeMap;

use plotline_sample::Domain;

use crate::axis::{Axis, AxisId};
use crate::error::ModelError;
use crate::interactive::InteractivePlot;
use crate::plot::{Plot, PlotId};
use crate::snapshot::{
    AxisData, FigureSnapshot, GridLineData, LegendData, ScaleData, SnapshotData, SnapshotOptions,
    TickData, TitleData, TooltipOptions,
};

/// Legend state of a figure. Always present, hidden by default.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    display: bool,
    position: String,
}

impl Default for Legend {
    fn default() -> Self {
        Self {
            display: false,
            position: String::from("top"),
        }
    }
}

impl Legend {
    /// Whether the legend is shown.
    pub fn displayed(&self) -> bool {
        self.display
    }

    /// Show or hide the legend.
    pub fn set_display(&mut self, display: bool) {
        self.display = display;
    }

    /// Set the placement edge (`top`, `bottom`, `left`, `right`).
    pub fn set_position(&mut self, position: impl Into<String>) {
        self.position = position.into();
    }

    fn wire(&self) -> LegendData {
        LegendData {
            display: self.display,
            position: self.position.clone(),
        }
    }
}

/// Title state of a figure. Always present, hidden until text is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    text: String,
    display: bool,
    font_size: f64,
    font_family: String,
    font_color: String,
    font_style: String,
    padding: f64,
    line_height: f64,
    position: String,
}

impl Default for Title {
    fn default() -> Self {
        Self {
            text: String::new(),
            display: false,
            font_size: 24.0,
            font_family: String::from("'Helvetica Neue', 'Helvetica', 'Arial', sans-serif"),
            font_color: String::from("#000"),
            font_style: String::from("bold"),
            padding: 10.0,
            line_height: 1.2,
            position: String::from("top"),
        }
    }
}

impl Title {
    /// The current title text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the title text and show the title.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.display = true;
    }

    /// Show or hide the title.
    pub fn set_display(&mut self, display: bool) {
        self.display = display;
    }

    /// Set the title font size in points.
    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    fn wire(&self) -> TitleData {
        TitleData {
            display: self.display,
            text: self.text.clone(),
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            font_color: self.font_color.clone(),
            font_style: self.font_style.clone(),
            padding: self.padding,
            line_height: self.line_height,
            position: self.position.clone(),
        }
    }
}

/// Global chart options.
#[derive(Debug, Clone, PartialEq)]
struct ChartOptions {
    animation: bool,
    responsive: bool,
    show_lines: bool,
    maintain_aspect_ratio: bool,
    tooltips_enabled: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            animation: false,
            responsive: true,
            show_lines: false,
            maintain_aspect_ratio: false,
            tooltips_enabled: false,
        }
    }
}

/// A complete chart description: an ordered plot sequence, at most one
/// interactive plot, axes, legend, title, and global options.
#[derive(Debug, Clone)]
pub struct Figure {
    options: ChartOptions,
    x_axes: Vec<Axis>,
    y_axes: Vec<Axis>,
    plots: Vec<Plot>,
    interactive: Option<InteractivePlot>,
    legend: Legend,
    title: Title,
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}

impl Figure {
    /// Create an empty figure with a default X and Y axis, a hidden
    /// legend, and a hidden title.
    pub fn new() -> Self {
        Self {
            options: ChartOptions::default(),
            x_axes: vec![Axis::new(true, 0)],
            y_axes: vec![Axis::new(false, 0)],
            plots: Vec::new(),
            interactive: None,
            legend: Legend::default(),
            title: Title::default(),
        }
    }

    /// Append a new plot bound to the default axes. Render order is
    /// insertion order.
    pub fn new_plot(&mut self) -> PlotId {
        let id = PlotId(self.plots.len());
        let plot = Plot::new(
            id.to_string(),
            self.default_x_axis().id().clone(),
            self.default_y_axis().id().clone(),
        );
        self.plots.push(plot);
        id
    }

    /// Access a plot by id.
    pub fn plot(&self, id: PlotId) -> Option<&Plot> {
        self.plots.get(id.0)
    }

    /// Mutable access to a plot by id.
    pub fn plot_mut(&mut self, id: PlotId) -> Option<&mut Plot> {
        self.plots.get_mut(id.0)
    }

    /// Number of non-interactive plots.
    pub fn plot_count(&self) -> usize {
        self.plots.len()
    }

    /// Add the interactive plot, bound to the default axes.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InteractiveExists`] if the figure already has
    /// one; a figure holds at most one interactive plot.
    pub fn new_interactive_plot(&mut self) -> Result<&mut InteractivePlot, ModelError> {
        if self.interactive.is_some() {
            return Err(ModelError::InteractiveExists);
        }
        let plot = InteractivePlot::new(
            self.default_x_axis().id().clone(),
            self.default_y_axis().id().clone(),
        );
        Ok(self.interactive.insert(plot))
    }

    /// The interactive plot, if one was added.
    pub fn interactive(&self) -> Option<&InteractivePlot> {
        self.interactive.as_ref()
    }

    /// Mutable access to the interactive plot.
    pub fn interactive_mut(&mut self) -> Option<&mut InteractivePlot> {
        self.interactive.as_mut()
    }

    /// Create an additional X axis.
    pub fn new_x_axis(&mut self) -> AxisId {
        let axis = Axis::new(true, self.x_axes.len());
        let id = axis.id().clone();
        self.x_axes.push(axis);
        id
    }

    /// Create an additional Y axis.
    pub fn new_y_axis(&mut self) -> AxisId {
        let axis = Axis::new(false, self.y_axes.len());
        let id = axis.id().clone();
        self.y_axes.push(axis);
        id
    }

    /// The default X axis.
    pub fn default_x_axis(&self) -> &Axis {
        &self.x_axes[0]
    }

    /// Mutable access to the default X axis.
    pub fn default_x_axis_mut(&mut self) -> &mut Axis {
        &mut self.x_axes[0]
    }

    /// The default Y axis.
    pub fn default_y_axis(&self) -> &Axis {
        &self.y_axes[0]
    }

    /// Mutable access to the default Y axis.
    pub fn default_y_axis_mut(&mut self) -> &mut Axis {
        &mut self.y_axes[0]
    }

    /// Look up an X axis by id.
    pub fn x_axis_mut(&mut self, id: &AxisId) -> Option<&mut Axis> {
        self.x_axes.iter_mut().find(|axis| axis.id() == id)
    }

    /// Look up a Y axis by id.
    pub fn y_axis_mut(&mut self, id: &AxisId) -> Option<&mut Axis> {
        self.y_axes.iter_mut().find(|axis| axis.id() == id)
    }

    /// Set the title text and show the title.
    pub fn set_title(&mut self, text: impl Into<String>) {
        self.title.set_text(text);
    }

    /// The title record.
    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Mutable access to the title record.
    pub fn title_mut(&mut self) -> &mut Title {
        &mut self.title
    }

    /// The legend record.
    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    /// Mutable access to the legend record.
    pub fn legend_mut(&mut self) -> &mut Legend {
        &mut self.legend
    }

    /// Route an interactive update into the sampling engine and merge the
    /// result: the sampled points become the interactive plot's line data,
    /// the X axis takes the requested domain, and the Y axis takes the
    /// explicit range when given or resumes auto bounds otherwise.
    ///
    /// A figure without an interactive plot (or with no bound function)
    /// ignores the request.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Sample`] when evaluation fails and
    /// [`ModelError::InvalidRange`] when a requested range is inverted. The
    /// plot's previous points survive a failed update.
    pub fn update_interactive(
        &mut self,
        params: &BTreeMap<String, f64>,
        domain: Domain,
        y_bounds: Option<(f64, f64)>,
    ) -> Result<(), ModelError> {
        let Some(ipl) = self.interactive.as_mut() else {
            return Ok(());
        };
        let Some(series) = ipl.sample(params, domain)? else {
            return Ok(());
        };
        ipl.plot_mut().set_line_points(&series.xs, &series.ys);

        let x_id = ipl.plot().x_axis().clone();
        let y_id = ipl.plot().y_axis().clone();
        if let Some(axis) = self.x_axis_mut(&x_id) {
            axis.set_bounds(domain.min, domain.max, None)?;
        }
        match y_bounds {
            Some((min, max)) => {
                if let Some(axis) = self.y_axis_mut(&y_id) {
                    axis.set_bounds(min, max, None)?;
                }
            }
            None => {
                if let Some(axis) = self.y_axis_mut(&y_id) {
                    axis.use_auto_bounds();
                }
            }
        }
        Ok(())
    }

    /// Produce the serializable snapshot of the current state.
    ///
    /// Auto-derived axis bounds are refreshed from the current plot
    /// extents first; nothing else in the model is mutated.
    pub fn snapshot(&mut self) -> FigureSnapshot {
        self.refresh_axis_bounds();

        let mut datasets: Vec<_> = self.plots.iter().map(Plot::dataset).collect();
        if let Some(ipl) = &self.interactive {
            datasets.push(ipl.plot().dataset());
        }

        let default_x = self.default_x_axis().bounds();

        FigureSnapshot {
            data: SnapshotData { datasets },
            error: String::new(),
            options: SnapshotOptions {
                animation: self.options.animation,
                responsive: self.options.responsive,
                show_lines: self.options.show_lines,
                maintain_aspect_ratio: self.options.maintain_aspect_ratio,
                tooltips: TooltipOptions {
                    enabled: self.options.tooltips_enabled,
                },
                legend: self.legend.wire(),
                title: self.title.wire(),
                scales: ScaleData {
                    x_axes: self.x_axes.iter().map(axis_data).collect(),
                    y_axes: self.y_axes.iter().map(axis_data).collect(),
                },
            },
            interactive: self.interactive.is_some(),
            defaultxmin: default_x.map(|b| b.min),
            defaultxmax: default_x.map(|b| b.max),
        }
    }

    /// Refresh every axis's auto bounds from the current plot extents.
    fn refresh_axis_bounds(&mut self) {
        let Self {
            x_axes,
            y_axes,
            plots,
            interactive,
            ..
        } = self;

        for axis in x_axes.iter_mut().chain(y_axes.iter_mut()) {
            axis.clear_extents();
        }

        let interactive_plot = interactive.as_ref().map(InteractivePlot::plot);
        for plot in plots.iter().chain(interactive_plot) {
            if let Some((min, max)) = plot.x_extent() {
                if let Some(axis) = x_axes.iter_mut().find(|a| a.id() == plot.x_axis()) {
                    axis.record_extent(plot.key(), min, max);
                }
            }
            if let Some((min, max)) = plot.y_extent() {
                if let Some(axis) = y_axes.iter_mut().find(|a| a.id() == plot.y_axis()) {
                    axis.record_extent(plot.key(), min, max);
                }
            }
        }

        for axis in x_axes.iter_mut().chain(y_axes.iter_mut()) {
            axis.refresh_auto_bounds();
        }
    }
}

fn axis_data(axis: &Axis) -> AxisData {
    let bounds = axis.bounds();
    AxisData {
        id: axis.id().as_str().to_owned(),
        kind: String::from("linear"),
        display: true,
        grid_lines: GridLineData {
            color: String::from("lightgray"),
            zero_line_color: String::from("black"),
        },
        ticks: TickData {
            min: bounds.map(|b| b.min),
            max: bounds.map(|b| b.max),
            step_size: bounds.map(|b| b.step),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// The reference two-plot scenario: y extents union to [1, 7].
    fn two_plot_figure() -> Figure {
        let mut figure = Figure::new();
        let first = figure.new_plot();
        figure
            .plot_mut(first)
            .unwrap()
            .set_line_points(&[0.0, 2.0, 4.0, 6.0, 8.0], &[5.0, 7.0, 3.0, 4.3, 2.0]);
        let second = figure.new_plot();
        figure
            .plot_mut(second)
            .unwrap()
            .set_line_points(&[0.0, 2.0, 4.0, 6.0, 8.0], &[1.0, 2.0, 3.0, 4.0, 6.0]);
        figure
    }

    #[test]
    fn snapshot_has_two_datasets_on_the_default_axes() {
        let mut figure = two_plot_figure();
        let snapshot = figure.snapshot();

        assert_eq!(snapshot.data.datasets.len(), 2);
        for dataset in &snapshot.data.datasets {
            assert_eq!(dataset.x_axis_id, "xax0");
            assert_eq!(dataset.y_axis_id, "yax0");
        }
        assert!(!snapshot.interactive);
    }

    #[test]
    fn default_y_bounds_cover_the_union_extent_with_margin() {
        let mut figure = two_plot_figure();
        figure.snapshot();

        let bounds = figure.default_y_axis().bounds().unwrap();
        // Union [1, 7], spread 6, margin 0.6.
        assert!((bounds.min - 0.4).abs() < 1e-12);
        assert!((bounds.max - 7.6).abs() < 1e-12);
    }

    #[test]
    fn y_bounds_are_independent_of_plot_order() {
        let mut forward = two_plot_figure();

        let mut reverse = Figure::new();
        let first = reverse.new_plot();
        reverse
            .plot_mut(first)
            .unwrap()
            .set_line_points(&[0.0, 2.0, 4.0, 6.0, 8.0], &[1.0, 2.0, 3.0, 4.0, 6.0]);
        let second = reverse.new_plot();
        reverse
            .plot_mut(second)
            .unwrap()
            .set_line_points(&[0.0, 2.0, 4.0, 6.0, 8.0], &[5.0, 7.0, 3.0, 4.3, 2.0]);

        forward.snapshot();
        reverse.snapshot();
        assert_eq!(
            forward.default_y_axis().bounds(),
            reverse.default_y_axis().bounds()
        );
    }

    #[test]
    fn at_most_one_interactive_plot() {
        let mut figure = Figure::new();
        figure.new_interactive_plot().unwrap();

        let err = figure.new_interactive_plot().unwrap_err();
        assert_eq!(err, ModelError::InteractiveExists);
    }

    #[test]
    fn snapshot_places_the_interactive_dataset_last() {
        let mut figure = two_plot_figure();
        figure.new_interactive_plot().unwrap();

        let snapshot = figure.snapshot();
        assert_eq!(snapshot.data.datasets.len(), 3);
        assert!(snapshot.interactive);
        assert_eq!(snapshot.data.datasets[2].label, "interactive");
    }

    #[test]
    fn snapshot_reports_default_x_bounds() {
        let mut figure = two_plot_figure();
        let snapshot = figure.snapshot();

        // Union [0, 8], spread 8, margin 0.8.
        assert!((snapshot.defaultxmin.unwrap() + 0.8).abs() < 1e-12);
        assert!((snapshot.defaultxmax.unwrap() - 8.8).abs() < 1e-12);
    }

    #[test]
    fn update_interactive_merges_sampled_points() {
        let mut figure = Figure::new();
        figure
            .new_interactive_plot()
            .unwrap()
            .bind_function("f(x) = x ^ 2")
            .unwrap();

        figure
            .update_interactive(&BTreeMap::new(), Domain::new(-1.0, 1.0), None)
            .unwrap();

        let ipl = figure.interactive().unwrap();
        assert!(!ipl.plot().points().is_empty());
        let x_bounds = figure.default_x_axis().bounds().unwrap();
        assert_eq!((x_bounds.min, x_bounds.max), (-1.0, 1.0));
    }

    #[test]
    fn update_interactive_without_a_plot_is_ignored() {
        let mut figure = Figure::new();
        figure
            .update_interactive(&BTreeMap::new(), Domain::new(0.0, 1.0), None)
            .unwrap();
        assert!(figure.default_x_axis().bounds().is_none());
    }

    #[test]
    fn update_interactive_applies_an_explicit_y_range() {
        let mut figure = Figure::new();
        figure
            .new_interactive_plot()
            .unwrap()
            .bind_function("f(x) = x")
            .unwrap();

        figure
            .update_interactive(&BTreeMap::new(), Domain::new(0.0, 1.0), Some((-5.0, 5.0)))
            .unwrap();

        let bounds = figure.default_y_axis().bounds().unwrap();
        assert_eq!((bounds.min, bounds.max), (-5.0, 5.0));
    }

    #[test]
    fn explicit_bounds_survive_snapshot_refresh() {
        let mut figure = two_plot_figure();
        figure
            .default_y_axis_mut()
            .set_bounds(-100.0, 100.0, None)
            .unwrap();

        let snapshot = figure.snapshot();
        let y_axis = &snapshot.options.scales.y_axes[0];
        assert_eq!(y_axis.ticks.min, Some(-100.0));
        assert_eq!(y_axis.ticks.max, Some(100.0));
    }

    #[test]
    fn snapshot_wire_shape_is_stable() {
        let mut figure = two_plot_figure();
        figure.set_title("Plot");
        figure.legend_mut().set_display(true);

        let value = serde_json::to_value(figure.snapshot()).unwrap();
        assert_eq!(value["options"]["title"]["text"], "Plot");
        assert_eq!(value["options"]["title"]["line_height"], 1.2);
        assert_eq!(value["options"]["legend"]["display"], true);
        assert_eq!(value["options"]["scales"]["xAxes"][0]["id"], "xax0");
        assert!(value["options"]["scales"]["yAxes"][0]["ticks"]["stepSize"].is_number());
        assert_eq!(value["data"]["datasets"][0]["xAxisID"], "xax0");
    }
}
