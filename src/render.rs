use std::{fmt::Write as _, io::ErrorKind, path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    chart::render_scrolled_chart,
    config::DashboardConfig,
    scroll::ScrollState,
    state::{DashboardState, Revision},
    view::{Color, DashboardView, Indicator},
};

const RESET: &str = "\x1b[0m";

fn paint(indicator: &Indicator) -> String {
    let code = match indicator.color {
        Color::Green => "\x1b[32m",
        Color::Red => "\x1b[31m",
    };
    format!("{code}{}{RESET}", indicator.label)
}

/// Text rendition of a view for the terminal.
pub fn terminal_frame(view: &DashboardView, scroll: &ScrollState) -> String {
    let mut frame = String::new();
    let _ = writeln!(frame, "== {} ==", view.header);
    let _ = writeln!(frame, "{} | {}", paint(&view.power), paint(&view.wifi));
    let _ = writeln!(frame, "Latest Temperature: {}", view.summary.temperature);
    let _ = writeln!(frame, "Latest Humidity: {}", view.summary.humidity);

    if !view.chart.is_empty() {
        let start = scroll.scroll_left();
        let _ = writeln!(
            frame,
            "Chart: {} points, showing {}-{} of {}px",
            view.chart.points.len(),
            start,
            start + scroll.visible_width(),
            view.chart.width
        );
        if let Some(newest) = view.chart.points.last() {
            let _ = writeln!(frame, "Newest point: {}", newest.label);
        }
    }

    let _ = writeln!(frame, "Last Updated: {}", view.last_updated);
    if let Some(reported) = &view.device_reported {
        let _ = writeln!(frame, "Device reported at {reported}");
    }
    frame
}

/// Redraws the dashboard whenever the state publishes a new revision.
pub struct Renderer {
    state: Arc<DashboardState>,
    scroll: ScrollState,
    chart_path: PathBuf,
}

impl Renderer {
    pub fn new(state: Arc<DashboardState>, config: &DashboardConfig) -> Self {
        Renderer {
            state,
            scroll: ScrollState::new(config.viewport_width),
            chart_path: config.chart_path.clone(),
        }
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    /// Projects the current state, pins the scroll position if the series
    /// changed, updates the chart file and returns the terminal frame. A
    /// chart that cannot be written is logged; the frame is still produced.
    pub async fn draw(&mut self) -> String {
        let snapshot = self.state.snapshot();
        let view = DashboardView::project(&snapshot, &Local);

        if self.scroll.observe(view.sensor_revision, view.chart.width) {
            debug!(scroll_left = self.scroll.scroll_left(), "chart scrolled to newest point");
        }

        if let Err(e) = self.write_chart(&view).await {
            warn!("{e:#}");
        }

        terminal_frame(&view, &self.scroll)
    }

    /// Writes the scrolled chart, or removes the file when the series is
    /// empty so it never shows a replaced series.
    async fn write_chart(&self, view: &DashboardView) -> anyhow::Result<()> {
        match render_scrolled_chart(&view.chart, &self.scroll)? {
            Some(svg) => tokio::fs::write(&self.chart_path, svg)
                .await
                .with_context(|| format!("failed to write chart to {}", self.chart_path.display())),
            None => match tokio::fs::remove_file(&self.chart_path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e).with_context(|| {
                    format!("failed to remove chart {}", self.chart_path.display())
                }),
                _ => Ok(()),
            },
        }
    }

    /// Prints a frame for the current state and again on every revision,
    /// until the state holder goes away.
    pub async fn run(mut self, mut changes: watch::Receiver<Revision>) {
        info!(chart = %self.chart_path.display(), "renderer started");
        loop {
            let frame = self.draw().await;
            println!("{frame}");

            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}
