//! End-to-end demo for Plotline chart sessions.
//!
//! Opens a browser window, pushes a two-line chart with a legend and a
//! title, adds an interactive plot for the in-page controls, resizes the
//! window, and saves the rendered chart to `plot.png`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `PLOTLINE_*` environment variables
//! 3. Start the session (service, browser, first client)
//! 4. Build and show the figure
//! 5. Save the capture and stop

use plotline_session::{Session, SessionConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the session cannot start, the render is never
/// acknowledged, or the capture fails.
fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("plotline-demo starting");

    let config = SessionConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        assets_dir = %config.assets_dir.display(),
        "configuration loaded"
    );

    let mut session = Session::new(config);
    session.start()?;

    session.with_figure(|figure| {
        let first = figure.new_plot();
        if let Some(plot) = figure.plot_mut(first) {
            plot.set_label("blue line");
            plot.set_line_points(&[0.0, 2.0, 4.0, 6.0, 8.0], &[5.0, 7.0, 3.0, 4.3, 2.0]);
            plot.set_line_color("#0000ff");
        }

        let second = figure.new_plot();
        if let Some(plot) = figure.plot_mut(second) {
            plot.set_label("red line");
            plot.set_line_points(&[0.0, 2.0, 4.0, 6.0, 8.0], &[1.0, 2.0, 3.0, 4.0, 6.0]);
            plot.set_line_color("#ff0000");
        }

        figure.legend_mut().set_display(true);
        figure.set_title("Plot");
    });

    // An interactive plot lets the in-page controls bind a function and
    // drive re-sampling while the static plots stay up.
    let accepted = session.with_figure(|figure| {
        figure
            .new_interactive_plot()
            .map_err(anyhow::Error::from)
            .and_then(|interactive| {
                interactive
                    .bind_function("f(x, a, b) = a * sin(x) + b")
                    .map(|params| params.to_vec())
                    .map_err(anyhow::Error::from)
            })
    })?;
    info!(params = ?accepted, "interactive function bound");

    session.show(false)?;
    session.resize(1200, 700)?;
    session.save("plot.png")?;

    session.stop()?;
    info!("plotline-demo finished");
    Ok(())
}
