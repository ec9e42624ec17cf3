use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;

use super::{ChartData, ChartType};
use crate::core::error::AppError;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const SERIES_COLOR: RGBColor = RGBColor(59, 130, 246);
const PIE_COLORS: [RGBColor; 6] = [
    RGBColor(255, 99, 132),
    RGBColor(54, 162, 235),
    RGBColor(255, 206, 86),
    RGBColor(75, 192, 192),
    RGBColor(153, 102, 255),
    RGBColor(255, 159, 64),
];

fn draw_err<E: std::fmt::Debug>(e: E) -> AppError {
    AppError::Internal(format!("Failed to render chart: {:?}", e))
}

/// Check that the axes or pie total of `chart` can be laid out
pub fn check_renderable(chart: &ChartData, chart_type: ChartType) -> Result<(), AppError> {
    match chart_type {
        ChartType::Pie | ChartType::Doughnut => pie_total(chart).map(|_| ()),
        ChartType::Scatter | ChartType::Bubble => {
            let points = chart.points();
            bounds(points.iter().map(|p| p.0))?;
            bounds(points.iter().map(|p| p.1))?;
            Ok(())
        }
        _ => bounds(chart.values().into_iter()).map(|_| ()),
    }
}

/// Render chart data as an SVG document
pub fn render_svg(chart: &ChartData, chart_type: ChartType, title: &str) -> Result<String, AppError> {
    check_renderable(chart, chart_type)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        match chart_type {
            ChartType::Pie => draw_pie(&root, chart, title, false)?,
            ChartType::Doughnut => draw_pie(&root, chart, title, true)?,
            ChartType::Scatter | ChartType::Bubble => draw_scatter(&root, chart, title)?,
            ChartType::Bar => draw_categorical(&root, chart, title, Style::Bar)?,
            ChartType::Area => draw_categorical(&root, chart, title, Style::Area)?,
            ChartType::Line | ChartType::Radar => draw_categorical(&root, chart, title, Style::Line)?,
        }

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

#[derive(Clone, Copy)]
enum Style {
    Bar,
    Line,
    Area,
}

fn out_of_range() -> AppError {
    AppError::BadRequest("Chart values are out of range".to_string())
}

/// Padded value range that always includes zero. Fails when the range or its
/// padding does not fit in an f64.
fn bounds(values: impl Iterator<Item = f64>) -> Result<(f64, f64), AppError> {
    let mut min = 0.0f64;
    let mut max = 0.0f64;
    for v in values {
        if !v.is_finite() {
            return Err(out_of_range());
        }
        min = min.min(v);
        max = max.max(v);
    }

    let span = max - min;
    if !span.is_finite() {
        return Err(out_of_range());
    }

    let (lo, hi) = if span.abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        let pad = span * 0.1;
        (if min < 0.0 { min - pad } else { min }, max + pad)
    };

    if lo.is_finite() && hi.is_finite() && (hi - lo).is_finite() {
        Ok((lo, hi))
    } else {
        Err(out_of_range())
    }
}

fn draw_categorical<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartData,
    title: &str,
    style: Style,
) -> Result<(), AppError> {
    let values = chart.values();
    let count = values.len().max(1) as u32;
    let (y_min, y_max) = bounds(values.iter().copied())?;

    let mut ctx = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..count).into_segmented(), y_min..y_max)
        .map_err(draw_err)?;

    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => chart
            .labels
            .get(*i as usize)
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(count.min(20) as usize)
        .x_label_formatter(&label_of)
        .draw()
        .map_err(draw_err)?;

    let centers = values
        .iter()
        .enumerate()
        .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v));

    match style {
        Style::Bar => {
            ctx.draw_series(
                Histogram::vertical(&ctx)
                    .style(SERIES_COLOR.mix(0.5).filled())
                    .margin(6)
                    .data(values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
            )
            .map_err(draw_err)?;
        }
        Style::Line => {
            ctx.draw_series(LineSeries::new(centers.clone(), SERIES_COLOR.stroke_width(2)))
                .map_err(draw_err)?;
            ctx.draw_series(centers.map(|p| Circle::new(p, 3, SERIES_COLOR.filled())))
                .map_err(draw_err)?;
        }
        Style::Area => {
            ctx.draw_series(
                AreaSeries::new(centers, 0.0, SERIES_COLOR.mix(0.3)).border_style(SERIES_COLOR),
            )
            .map_err(draw_err)?;
        }
    }

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartData,
    title: &str,
) -> Result<(), AppError> {
    let points = chart.points();
    let (x_min, x_max) = bounds(points.iter().map(|p| p.0))?;
    let (y_min, y_max) = bounds(points.iter().map(|p| p.1))?;

    let mut ctx = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;

    ctx.configure_mesh().draw().map_err(draw_err)?;

    ctx.draw_series(
        points
            .iter()
            .map(|(x, y)| Circle::new((*x, *y), 6, SERIES_COLOR.mix(0.6).filled())),
    )
    .map_err(draw_err)?;

    Ok(())
}

/// Pie slices never go below zero
fn pie_values(chart: &ChartData) -> Vec<f64> {
    chart.values().into_iter().map(|v| v.max(0.0)).collect()
}

fn pie_total(chart: &ChartData) -> Result<f64, AppError> {
    let total: f64 = pie_values(chart).iter().sum();
    if total.is_finite() {
        Ok(total)
    } else {
        Err(out_of_range())
    }
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartData,
    title: &str,
    hollow: bool,
) -> Result<(), AppError> {
    let area = root
        .titled(title, ("sans-serif", 24))
        .map_err(draw_err)?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = (width.min(height) as f64 / 2.0 - 60.0).max(10.0);

    let values = pie_values(chart);
    let total = pie_total(chart)?;
    if total <= 0.0 {
        area.draw(&Text::new(
            "No data",
            (center.0 - 30, center.1),
            ("sans-serif", 18),
        ))
        .map_err(draw_err)?;
        return Ok(());
    }

    let mut start = -PI / 2.0;
    for (i, value) in values.iter().enumerate() {
        let sweep = value / total * 2.0 * PI;
        if sweep <= 0.0 {
            continue;
        }
        let color = PIE_COLORS[i % PIE_COLORS.len()];

        let steps = ((sweep / (2.0 * PI)) * 120.0).ceil().max(2.0) as usize;
        let mut wedge = vec![center];
        wedge.extend((0..=steps).map(|s| {
            let angle = start + sweep * s as f64 / steps as f64;
            arc_point(center, radius, angle)
        }));
        area.draw(&Polygon::new(wedge, color.mix(0.8).filled()))
            .map_err(draw_err)?;

        let (lx, ly) = arc_point(center, radius + 24.0, start + sweep / 2.0);
        area.draw(&Text::new(
            chart.label_at(i),
            (lx - 20, ly - 6),
            ("sans-serif", 14),
        ))
        .map_err(draw_err)?;

        start += sweep;
    }

    if hollow {
        area.draw(&Circle::new(center, (radius * 0.5) as i32, WHITE.filled()))
            .map_err(draw_err)?;
    }

    Ok(())
}

fn arc_point(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 + (radius * angle.sin()).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::charts::project_chart;
    use crate::modules::spreadsheet::CellValue;

    fn chart(chart_type: ChartType) -> ChartData {
        let rows = vec![
            vec![CellValue::Text("Q1".into()), CellValue::Int(4)],
            vec![CellValue::Text("Q2".into()), CellValue::Int(7)],
            vec![CellValue::Text("Q3".into()), CellValue::Float(5.5)],
        ];
        project_chart(&rows, 0, 1, chart_type).unwrap()
    }

    #[test]
    fn test_renders_every_projectable_type() {
        for chart_type in [
            ChartType::Bar,
            ChartType::Line,
            ChartType::Area,
            ChartType::Pie,
            ChartType::Doughnut,
            ChartType::Scatter,
        ] {
            let svg = render_svg(&chart(chart_type), chart_type, "Quarterly").unwrap();
            assert!(svg.contains("<svg"), "{} produced no svg", chart_type);
            assert!(svg.contains("Quarterly"));
        }
    }

    #[test]
    fn test_empty_chart_still_renders() {
        let svg = render_svg(&ChartData::default(), ChartType::Pie, "Empty").unwrap();
        assert!(svg.contains("No data"));

        let svg = render_svg(&ChartData::default(), ChartType::Bar, "Empty").unwrap();
        assert!(svg.contains("<svg"));
    }

    fn chart_of(values: &[f64]) -> ChartData {
        serde_json::from_value(serde_json::json!({
            "labels": ["a", "b"],
            "datasets": [{ "data": values }]
        }))
        .unwrap()
    }

    #[test]
    fn test_extreme_values_are_rejected_not_rendered() {
        let opposite = chart_of(&[1.7e308, -1.7e308]);
        for chart_type in [ChartType::Bar, ChartType::Line, ChartType::Area, ChartType::Scatter] {
            let result = render_svg(&opposite, chart_type, "Huge");
            assert!(
                matches!(result, Err(AppError::BadRequest(_))),
                "{} accepted extreme values",
                chart_type
            );
        }

        let same_sign = chart_of(&[1.7e308, 1.7e308]);
        assert!(matches!(
            render_svg(&same_sign, ChartType::Pie, "Huge"),
            Err(AppError::BadRequest(_))
        ));
        assert!(check_renderable(&same_sign, ChartType::Doughnut).is_err());
    }

    #[test]
    fn test_large_but_representable_values_render() {
        let chart = chart_of(&[1.0e300, -1.0e300]);
        check_renderable(&chart, ChartType::Bar).unwrap();
        check_renderable(&chart, ChartType::Scatter).unwrap();
    }

    #[test]
    fn test_bounds_rejects_unrepresentable_ranges() {
        assert!(bounds([f64::NAN].into_iter()).is_err());
        assert!(bounds([f64::INFINITY].into_iter()).is_err());
        assert!(bounds([f64::MAX].into_iter()).is_err());
        assert_eq!(bounds([5.0].into_iter()).unwrap(), (0.0, 5.5));
        assert_eq!(bounds(std::iter::empty()).unwrap(), (-1.0, 1.0));
    }
}
