use plotters::prelude::*;

use crate::{
    scroll::ScrollState,
    view::{ChartPoint, ChartSpec},
};

pub const TEMPERATURE_COLOR: RGBColor = RGBColor(0x88, 0x84, 0xd8);
pub const HUMIDITY_COLOR: RGBColor = RGBColor(0x82, 0xca, 0x9d);
/// Room below the plot for the vertical date labels
pub const X_LABEL_AREA: u32 = 120;

fn value_range(points: &[ChartPoint]) -> (f64, f64) {
    let values = points.iter().flat_map(|p| [p.temperature, p.humidity]);
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (min.floor() - 1.0, max.ceil() + 1.0)
}

/// Draws both series at full width. `None` when there is nothing to draw.
pub fn render_chart_svg(chart: &ChartSpec) -> anyhow::Result<Option<String>> {
    if chart.is_empty() {
        return Ok(None);
    }

    let points = &chart.points;
    let count = points.len();
    let (y_min, y_max) = value_range(points);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (chart.width, chart.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.margin(5, 5, 5, 5);

        let label_at = |x: &f64| {
            let index = x.round();
            if (x - index).abs() > f64::EPSILON || index < 0.0 {
                return String::new();
            }
            points
                .get(index as usize)
                .map(|p| p.label.clone())
                .unwrap_or_default()
        };

        let mut ctx = ChartBuilder::on(&root)
            .x_label_area_size(X_LABEL_AREA)
            .right_y_label_area_size(30)
            .build_cartesian_2d(-0.5f64..(count as f64 - 0.5), y_min..y_max)?;

        ctx.configure_mesh()
            .x_labels(count)
            .x_label_formatter(&label_at)
            .x_label_style(
                ("sans-serif", 10)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .y_labels(6)
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        ctx.draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.temperature)),
            TEMPERATURE_COLOR.stroke_width(2),
        ))?
        .label("temperature")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &TEMPERATURE_COLOR));

        ctx.draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.humidity)),
            HUMIDITY_COLOR.stroke_width(2),
        ))?
        .label("humidity")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &HUMIDITY_COLOR));

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(Some(svg))
}

/// Wraps the full chart in a viewport `scroll.viewport_width()` wide, offset
/// by the current scroll position.
pub fn render_scrolled_chart(
    chart: &ChartSpec,
    scroll: &ScrollState,
) -> anyhow::Result<Option<String>> {
    let Some(inner) = render_chart_svg(chart)? else {
        return Ok(None);
    };

    let inner = inner
        .trim_start()
        .strip_prefix("<?xml")
        .and_then(|rest| rest.split_once("?>"))
        .map(|(_, body)| body)
        .unwrap_or(&inner);

    let width = scroll.visible_width();
    let height = chart.height;
    let x = scroll.scroll_left();
    Ok(Some(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="{x} 0 {width} {height}">{inner}</svg>"#
    )))
}
