use crate::config::{ChartConfig, OutputFormat};
use crate::heatmap::HeatmapMatrix;
use crate::projection::{BarEntry, ChartType, Point, Projection, TableData};
use crate::render::ChartRenderer;
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use tracing::debug;

const FONT: &str = "sans-serif";
const TABLE_ROW_HEIGHT: i32 = 22;

/// Draws projections with plotters, as PNG or SVG depending on the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotRenderer;

impl ChartRenderer for PlotRenderer {
    fn render(&self, chart: ChartType, projection: &Projection, config: &ChartConfig) -> Result<Vec<u8>> {
        if config.width == 0 || config.height == 0 {
            bail!("Chart size must be non-zero (got {}x{})", config.width, config.height);
        }
        match config.format {
            OutputFormat::Png => render_png(chart, projection, config),
            OutputFormat::Svg => render_svg(chart, projection, config),
            OutputFormat::Json => bail!("Plot renderer cannot produce JSON output"),
        }
    }
}

fn render_png(chart: ChartType, projection: &Projection, config: &ChartConfig) -> Result<Vec<u8>> {
    let (width, height) = (config.width, config.height);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(&root, chart, projection, config)?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

fn render_svg(chart: ChartType, projection: &Projection, config: &ChartConfig) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (config.width, config.height)).into_drawing_area();
        draw(&root, chart, projection, config)?;
    }
    Ok(svg.into_bytes())
}

fn draw<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: ChartType,
    projection: &Projection,
    config: &ChartConfig,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    if projection.is_empty() {
        draw_no_data(root, config)?;
    } else {
        match projection {
            Projection::Points(points) => draw_points(root, points, chart == ChartType::Line, config)?,
            Projection::Bars(bars) => draw_bars(root, bars, config)?,
            Projection::Heatmap(matrix) => draw_heatmap(root, matrix, config)?,
            Projection::Histogram(values) => draw_histogram(root, values, config)?,
            Projection::Table(table) => draw_table(root, table, config)?,
        }
    }

    root.present().context("Failed to present drawing")?;
    Ok(())
}

fn draw_no_data<DB>(root: &DrawingArea<DB, Shift>, config: &ChartConfig) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = root.dim_in_pixel();
    if let Some(title) = &config.title {
        root.draw(&Text::new(title.as_str(), (10, 10), (FONT, 20)))
            .context("Failed to draw title")?;
    }
    root.draw(&Text::new("No data", (w as i32 / 2 - 30, h as i32 / 2), (FONT, 20)))
        .context("Failed to draw placeholder")?;
    Ok(())
}

fn draw_points<DB>(
    root: &DrawingArea<DB, Shift>,
    points: &[Point],
    as_line: bool,
    config: &ChartConfig,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_range = padded_range(points.iter().map(|p| p.x));
    let y_range = padded_range(points.iter().map(|p| p.y));

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(config.title.as_deref().unwrap_or(""), (FONT, 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(config.x_label.clone().unwrap_or_default())
        .y_desc(config.y_label.clone().unwrap_or_default())
        .draw()
        .context("Failed to draw mesh")?;

    let color = parse_color(&config.color);
    if as_line {
        chart
            .draw_series(LineSeries::new(
                points.iter().map(|p| (p.x, p.y)),
                color.stroke_width(2),
            ))
            .context("Failed to draw line series")?;
    } else {
        chart
            .draw_series(points.iter().map(|p| Circle::new((p.x, p.y), 3, color.filled())))
            .context("Failed to draw point series")?;
    }
    Ok(())
}

fn draw_bars<DB>(root: &DrawingArea<DB, Shift>, bars: &[BarEntry], config: &ChartConfig) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
    let x_range = 0.0..(bars.len() as f64);
    let y_range = padded_range(bars.iter().map(|b| b.value).chain(std::iter::once(0.0)));

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(config.title.as_deref().unwrap_or(""), (FONT, 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| category_label(&labels, *x))
        .x_desc(config.x_label.clone().unwrap_or_default())
        .y_desc(config.y_label.clone().unwrap_or_default())
        .draw()
        .context("Failed to draw mesh")?;

    let color = parse_color(&config.color);
    let bar_width = 0.8;
    chart
        .draw_series(bars.iter().enumerate().map(|(slot, bar)| {
            let x_center = slot as f64 + 0.5;
            Rectangle::new(
                [
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, bar.value),
                ],
                color.filled(),
            )
        }))
        .context("Failed to draw bars")?;
    Ok(())
}

fn draw_heatmap<DB>(root: &DrawingArea<DB, Shift>, matrix: &HeatmapMatrix, config: &ChartConfig) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let cols = matrix.col_labels.len();
    let rows = matrix.row_labels.len();
    let col_labels: Vec<&str> = matrix.col_labels.iter().map(String::as_str).collect();
    let row_labels: Vec<&str> = matrix.row_labels.iter().map(String::as_str).collect();

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(config.title.as_deref().unwrap_or(""), (FONT, 20))
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..cols as f64, 0.0..rows as f64)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&|x| category_label(&col_labels, *x))
        .y_label_formatter(&|y| category_label(&row_labels, *y))
        .x_desc(config.x_label.clone().unwrap_or_default())
        .y_desc(config.y_label.clone().unwrap_or_default())
        .draw()
        .context("Failed to draw mesh")?;

    let base = parse_color(&config.color);
    let (lo, hi) = matrix.value_range();
    let cells = matrix.values.iter().enumerate().flat_map(|(r, row)| {
        row.iter().enumerate().map(move |(c, &v)| {
            let t = if hi > lo { (v - lo) / (hi - lo) } else { 1.0 };
            Rectangle::new(
                [(c as f64, r as f64), (c as f64 + 1.0, r as f64 + 1.0)],
                ramp(base, t).filled(),
            )
        })
    });
    chart.draw_series(cells).context("Failed to draw heatmap cells")?;
    Ok(())
}

fn draw_histogram<DB>(root: &DrawingArea<DB, Shift>, values: &[f64], config: &ChartConfig) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bins = histogram_bins(values, config.histogram_bins)?;
    let x_range = padded_range(bins.iter().flat_map(|b| [b.start, b.end]));
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(config.title.as_deref().unwrap_or(""), (FONT, 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, 0.0..(y_max * 1.05).max(1.0))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(config.x_label.clone().unwrap_or_default())
        .y_desc(config.y_label.clone().unwrap_or_else(|| "count".to_string()))
        .draw()
        .context("Failed to draw mesh")?;

    let color = parse_color(&config.color);
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.mix(0.8).filled())
        }))
        .context("Failed to draw histogram bins")?;
    Ok(())
}

fn draw_table<DB>(root: &DrawingArea<DB, Shift>, table: &TableData, config: &ChartConfig) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = root.dim_in_pixel();
    let area = match &config.title {
        Some(title) => root.titled(title, (FONT, 20)).context("Failed to draw title")?,
        None => root.clone(),
    };
    let (area_w, area_h) = area.dim_in_pixel();
    let top = (h - area_h) as i32 + 10;
    let col_width = ((area_w.saturating_sub(20)) / table.headers.len().max(1) as u32).max(1) as i32;
    let fits = ((area_h as i32 - 20) / TABLE_ROW_HEIGHT - 1).max(0) as usize;
    if table.rows.len() > fits {
        debug!("Table truncated to {} of {} rows", fits, table.rows.len());
    }

    let rows = std::iter::once(&table.headers).chain(table.rows.iter().take(fits));
    for (r, cells) in rows.enumerate() {
        let y = top + r as i32 * TABLE_ROW_HEIGHT;
        for (c, cell) in cells.iter().enumerate() {
            let x = 10 + c as i32 * col_width;
            root.draw(&Text::new(cell.as_str(), (x + 4, y + 4), (FONT, 14)))
                .context("Failed to draw table cell")?;
        }
        let rule_y = y + TABLE_ROW_HEIGHT;
        root.draw(&PathElement::new(vec![(10, rule_y), (w as i32 - 10, rule_y)], BLACK.mix(0.3)))
            .context("Failed to draw table rule")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bin {
    start: f64,
    end: f64,
    count: usize,
}

/// Equal-width bins over the value range. The last bin includes the maximum.
fn histogram_bins(values: &[f64], bins: usize) -> Result<Vec<Bin>> {
    if bins == 0 {
        bail!("Histogram needs at least one bin");
    }
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return Ok(Vec::new());
    }
    if lo == hi {
        return Ok(vec![Bin { start: lo - 0.5, end: hi + 0.5, count: values.len() }]);
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Ok(out)
}

/// Range covering all values with 5% padding; degenerate ranges widen by 1.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Label of the category slot containing `x`.
fn category_label(labels: &[&str], x: f64) -> String {
    if x < 0.0 {
        return String::new();
    }
    labels.get(x as usize).map(|l| l.to_string()).unwrap_or_default()
}

/// Blend from white (t = 0) to `base` (t = 1).
fn ramp(base: RGBColor, t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let blend = |c: u8| (255.0 - (255.0 - c as f64) * t).round() as u8;
    RGBColor(blend(base.0), blend(base.1), blend(base.2))
}

/// Parse color string to RGBColor
fn parse_color(color_str: &Option<String>) -> RGBColor {
    match color_str.as_deref() {
        Some("red") => RED,
        Some("green") => GREEN,
        Some("blue") => BLUE,
        Some("black") => BLACK,
        Some("yellow") => YELLOW,
        Some("cyan") => CYAN,
        Some("magenta") => MAGENTA,
        Some("white") => WHITE,
        _ => BLUE, // default
    }
}
