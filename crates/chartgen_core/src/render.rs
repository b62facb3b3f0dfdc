//! Chart rendering. Column selection per chart type follows a fixed
//! priority policy over the table's numeric/categorical split; drawing is
//! plotters into an in-memory RGB buffer, encoded as PNG and base64.
//!
//! A chart whose data prerequisites cannot be met at all is an explicit
//! [`RenderError::Unsupported`] rather than an empty figure, so callers get
//! a message naming what is missing instead of a blank image.

use crate::classify::ChartType;
use crate::table::{Column, Table};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::element::Pie;
use plotters::prelude::*;
use std::io::Cursor;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 720;

/// Slice/bucket limits mirrored from the selection policy.
const PIE_MAX_SLICES: usize = 8;
const PIE_NUMERIC_BINS: usize = 5;
const HISTOGRAM_BINS: usize = 20;
const HISTOGRAM_FALLBACK_VALUES: usize = 15;
const BAR_FALLBACK_VALUES: usize = 10;
const BOX_MAX_COLUMNS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The table cannot support the requested chart at all.
    #[error("cannot draw {chart}: {reason}")]
    Unsupported { chart: &'static str, reason: String },
    /// Anything that went wrong while drawing; no partial image escapes.
    #[error("rendering failed: {0}")]
    Draw(String),
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub image_base64: String,
    pub chart_type: ChartType,
}

fn unsupported(chart: &'static str, reason: impl Into<String>) -> RenderError {
    RenderError::Unsupported { chart, reason: reason.into() }
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn palette_color(i: usize) -> RGBColor {
    // matplotlib tab10, the de-facto default cycle
    const COLORS: [RGBColor; 10] = [
        RGBColor(31, 119, 180),
        RGBColor(255, 127, 14),
        RGBColor(44, 160, 44),
        RGBColor(214, 39, 40),
        RGBColor(148, 103, 189),
        RGBColor(140, 86, 75),
        RGBColor(227, 119, 194),
        RGBColor(127, 127, 127),
        RGBColor(188, 189, 34),
        RGBColor(23, 190, 207),
    ];
    COLORS[i % COLORS.len()]
}

pub fn render_chart(
    table: &Table,
    chart_type: ChartType,
    query: &str,
) -> Result<RenderResult, RenderError> {
    let title = format!("Graph for: {query}");
    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        match chart_type {
            ChartType::LineChart => draw_line(&root, table, &title)?,
            ChartType::BarChart => draw_bar(&root, table, &title)?,
            ChartType::ScatterPlot => draw_scatter(&root, table, &title)?,
            ChartType::PieChart => draw_pie(&root, table, &title)?,
            ChartType::Histogram => draw_histogram(&root, table, &title)?,
            ChartType::BoxPlot => draw_box(&root, table, &title)?,
            ChartType::Heatmap => draw_heatmap(&root, table, &title)?,
        }
        root.present().map_err(draw_err)?;
    }

    let img = RgbImage::from_raw(WIDTH, HEIGHT, buf)
        .ok_or_else(|| RenderError::Draw("pixel buffer size mismatch".into()))?;
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(draw_err)?;

    Ok(RenderResult { image_base64: BASE64.encode(&png), chart_type })
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// Extent of a series with a little padding, so degenerate (constant or
/// single-point) data still produces a drawable axis.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1e-9).max((max.abs() + min.abs()) * 1e-6 + 1e-9);
    (min - pad, max + pad)
}

/// First numeric column's series, falling back to coercing the first column
/// of any kind; row index is the x value.
fn indexed_fallback_series(table: &Table) -> Vec<(usize, f64)> {
    if let Some(col) = table.numeric_columns().first() {
        return col.numeric_series();
    }
    table.columns().first().map(|c| c.numeric_series()).unwrap_or_default()
}

/// Distinct values of a column with their frequencies, most frequent first.
/// Ties keep first-appearance order.
fn value_counts(col: &Column, top: usize) -> Vec<(String, usize)> {
    let mut order: Vec<String> = vec![];
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for v in col.values.iter().flatten() {
        if !counts.contains_key(v) {
            order.push(v.clone());
        }
        *counts.entry(v.clone()).or_insert(0) += 1;
    }
    let mut pairs: Vec<(String, usize)> =
        order.into_iter().map(|k| { let c = counts[&k]; (k, c) }).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.truncate(top);
    pairs
}

/// Grouped means for bar charts: first categorical column groups the first
/// numeric column, in first-appearance order.
pub fn bar_groups(table: &Table) -> Option<Vec<(String, f64)>> {
    let cat = table.categorical_columns().into_iter().next()?;
    let num = table.numeric_columns().into_iter().next()?;
    let nums = num.numeric_values();

    let mut order: Vec<String> = vec![];
    let mut sums: std::collections::HashMap<String, (f64, usize)> =
        std::collections::HashMap::new();
    for (i, key) in cat.values.iter().enumerate() {
        let (Some(key), Some(v)) = (key, nums.get(i).copied().flatten()) else { continue };
        if !sums.contains_key(key) {
            order.push(key.clone());
        }
        let entry = sums.entry(key.clone()).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    Some(
        order
            .into_iter()
            .map(|k| { let (sum, n) = sums[&k]; (k, sum / n as f64) })
            .collect(),
    )
}

/// Pairwise-complete Pearson correlation over all numeric columns. The
/// diagonal is exactly 1.0; constant columns correlate as 0.0 off-diagonal.
pub fn correlation_matrix(table: &Table) -> Option<(Vec<String>, Vec<Vec<f64>>)> {
    let cols = table.numeric_columns();
    if cols.len() < 2 {
        return None;
    }
    let names: Vec<String> = cols.iter().map(|c| c.name.clone()).collect();
    let series: Vec<Vec<Option<f64>>> = cols.iter().map(|c| c.numeric_values()).collect();

    let k = series.len();
    let mut matrix = vec![vec![0.0f64; k]; k];
    for i in 0..k {
        for j in 0..k {
            matrix[i][j] = if i == j { 1.0 } else { pearson(&series[i], &series[j]) };
        }
    }
    Some((names, matrix))
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return 0.0;
    }
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Fixed-width bins over present values; `(lo, hi, count)` per bin.
fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return vec![];
    }
    if max == min {
        return vec![(min - 0.5, min + 0.5, values.len())];
    }
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (min + i as f64 * width, min + (i + 1) as f64 * width, c))
        .collect()
}

fn draw_line(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let nums = table.numeric_columns();
    let cats = table.categorical_columns();

    // (points, x label, y label, optional category tick labels)
    let (points, x_desc, y_desc, tick_labels): (Vec<(f64, f64)>, String, String, Option<Vec<String>>) =
        if nums.len() >= 2 {
            let xs = nums[0].numeric_values();
            let ys = nums[1].numeric_values();
            let pts = xs
                .iter()
                .zip(&ys)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect();
            (pts, nums[0].name.clone(), nums[1].name.clone(), None)
        } else if nums.len() == 1 && !cats.is_empty() {
            let labels: Vec<String> =
                cats[0].values.iter().map(|v| v.clone().unwrap_or_default()).collect();
            let pts = nums[0]
                .numeric_series()
                .into_iter()
                .map(|(i, v)| (i as f64, v))
                .collect();
            (pts, cats[0].name.clone(), nums[0].name.clone(), Some(labels))
        } else {
            let series = indexed_fallback_series(table);
            let y_name = table.columns().first().map(|c| c.name.clone()).unwrap_or_default();
            let pts = series.into_iter().map(|(i, v)| (i as f64, v)).collect();
            (pts, "Index".into(), y_name, None)
        };

    if points.is_empty() {
        return Err(unsupported("line chart", "no plottable values in the table"));
    }

    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;

    let category_fmt;
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(&x_desc).y_desc(&y_desc);
    if let Some(labels) = &tick_labels {
        category_fmt = move |x: &f64| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };
        mesh.x_label_formatter(&category_fmt);
    }
    mesh.draw().map_err(draw_err)?;

    let color = palette_color(0);
    chart
        .draw_series(LineSeries::new(points.iter().cloned(), color.stroke_width(2)))
        .map_err(draw_err)?;
    chart
        .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_bar(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let nums = table.numeric_columns();
    let cats = table.categorical_columns();

    let (labels, values, y_desc): (Vec<String>, Vec<f64>, String) =
        if !cats.is_empty() && !nums.is_empty() {
            let groups = bar_groups(table)
                .ok_or_else(|| unsupported("bar chart", "no grouped values available"))?;
            let y = format!("Average {}", nums[0].name);
            let (l, v) = groups.into_iter().unzip();
            (l, v, y)
        } else if nums.len() >= 2 {
            let values: Vec<f64> =
                nums[1].numeric_values().into_iter().map(|v| v.unwrap_or(0.0)).collect();
            let labels = (0..values.len()).map(|i| i.to_string()).collect();
            (labels, values, nums[1].name.clone())
        } else {
            let col = table
                .columns()
                .first()
                .ok_or_else(|| unsupported("bar chart", "table has no columns"))?;
            let counts = value_counts(col, BAR_FALLBACK_VALUES);
            let (l, v): (Vec<String>, Vec<usize>) = counts.into_iter().unzip();
            (l, v.into_iter().map(|c| c as f64).collect(), "Count".into())
        };

    if values.is_empty() {
        return Err(unsupported("bar chart", "no values to plot"));
    }
    draw_labeled_bars(root, title, &labels, &values, &y_desc)
}

/// Shared vertical-bar drawing for bar charts and the histogram fallback.
fn draw_labeled_bars(
    root: &Area,
    title: &str,
    labels: &[String],
    values: &[f64],
    y_desc: &str,
) -> Result<(), RenderError> {
    let n = values.len();
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_lo = min.min(0.0) * 1.05 - 1e-9;
    let y_hi = max.max(0.0) * 1.05 + 1e-9;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..n as f64, y_lo..y_hi)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_desc)
        .x_labels(n.min(20))
        .x_label_formatter(&|x: &f64| {
            let i = x.floor();
            if (x - i - 0.5).abs() < 0.5 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &v)| {
            Rectangle::new(
                [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, v)],
                palette_color(0).mix(0.8).filled(),
            )
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_scatter(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let nums = table.numeric_columns();

    let (points, x_desc, y_desc): (Vec<(f64, f64)>, String, String) = if nums.len() >= 2 {
        let xs = nums[0].numeric_values();
        let ys = nums[1].numeric_values();
        let pts = xs
            .iter()
            .zip(&ys)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect();
        (pts, nums[0].name.clone(), nums[1].name.clone())
    } else {
        let series = indexed_fallback_series(table);
        let y_name = nums
            .first()
            .map(|c| c.name.clone())
            .or_else(|| table.columns().first().map(|c| c.name.clone()))
            .unwrap_or_default();
        (series.into_iter().map(|(i, v)| (i as f64, v)).collect(), "Index".into(), y_name)
    };

    if points.is_empty() {
        return Err(unsupported("scatter plot", "no plottable values in the table"));
    }

    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;
    chart.configure_mesh().x_desc(&x_desc).y_desc(&y_desc).draw().map_err(draw_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, palette_color(0).mix(0.6).filled())),
        )
        .map_err(draw_err)?;
    Ok(())
}

fn draw_pie(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let cats = table.categorical_columns();
    let nums = table.numeric_columns();

    let (labels, sizes): (Vec<String>, Vec<f64>) = if let Some(cat) = cats.first() {
        let counts = value_counts(cat, PIE_MAX_SLICES);
        let (l, c): (Vec<String>, Vec<usize>) = counts.into_iter().unzip();
        (l, c.into_iter().map(|v| v as f64).collect())
    } else if let Some(num) = nums.first() {
        let values: Vec<f64> =
            num.numeric_series().into_iter().map(|(_, v)| v).collect();
        if values.is_empty() {
            return Err(unsupported("pie chart", "no values to bucket"));
        }
        let bins = histogram_bins(&values, PIE_NUMERIC_BINS);
        bins.into_iter()
            .filter(|(_, _, c)| *c > 0)
            .map(|(lo, hi, c)| (format!("{lo:.1}–{hi:.1}"), c as f64))
            .unzip()
    } else {
        return Err(unsupported("pie chart", "table has no columns to slice"));
    };

    if sizes.is_empty() {
        return Err(unsupported("pie chart", "no values to slice"));
    }

    let titled = root.titled(title, ("sans-serif", 28)).map_err(draw_err)?;
    let (w, h) = (titled.dim_in_pixel().0 as i32, titled.dim_in_pixel().1 as i32);
    let center = (w / 2, h / 2);
    let radius = (w.min(h) as f64) * 0.35;
    let colors: Vec<RGBColor> = (0..sizes.len()).map(palette_color).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 18).into_font());
    pie.percentages(("sans-serif", 16).into_font().color(&BLACK));
    titled.draw(&pie).map_err(draw_err)?;
    Ok(())
}

fn draw_histogram(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let nums = table.numeric_columns();

    if let Some(num) = nums.first() {
        let values: Vec<f64> = num.numeric_series().into_iter().map(|(_, v)| v).collect();
        if values.is_empty() {
            return Err(unsupported("histogram", "numeric column has no values"));
        }
        let bins = histogram_bins(&values, HISTOGRAM_BINS);
        let x_lo = bins.first().map(|b| b.0).unwrap_or(0.0);
        let x_hi = bins.last().map(|b| b.1).unwrap_or(1.0);
        let y_hi = bins.iter().map(|b| b.2).max().unwrap_or(1) as f64 * 1.05 + 1e-9;

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0f64..y_hi)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_desc(&num.name)
            .y_desc("Frequency")
            .draw()
            .map_err(draw_err)?;
        chart
            .draw_series(bins.iter().map(|&(lo, hi, count)| {
                Rectangle::new(
                    [(lo, 0.0), (hi, count as f64)],
                    palette_color(0).mix(0.7).filled(),
                )
            }))
            .map_err(draw_err)?;
        return Ok(());
    }

    // No numeric column: degrade to a frequency bar chart of the first
    // column's most common values.
    let col = table
        .columns()
        .first()
        .ok_or_else(|| unsupported("histogram", "table has no columns"))?;
    let counts = value_counts(col, HISTOGRAM_FALLBACK_VALUES);
    if counts.is_empty() {
        return Err(unsupported("histogram", "no values to count"));
    }
    let (labels, values): (Vec<String>, Vec<usize>) = counts.into_iter().unzip();
    let values: Vec<f64> = values.into_iter().map(|c| c as f64).collect();
    draw_labeled_bars(root, title, &labels, &values, "Count")
}

fn draw_box(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let cols: Vec<&Column> =
        table.numeric_columns().into_iter().take(BOX_MAX_COLUMNS).collect();
    let series: Vec<(String, Vec<f64>)> = cols
        .iter()
        .map(|c| (c.name.clone(), c.numeric_series().into_iter().map(|(_, v)| v).collect()))
        .filter(|(_, vals): &(String, Vec<f64>)| !vals.is_empty())
        .collect();
    if series.is_empty() {
        return Err(unsupported("box plot", "requires at least 1 numeric column"));
    }

    let (y_min, y_max) = padded_range(series.iter().flat_map(|(_, v)| v.iter().cloned()));
    let names: Vec<String> = series.iter().map(|(n, _)| n.clone()).collect();
    let n = series.len();

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), y_min as f32..y_max as f32)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(series.iter().enumerate().map(|(i, (_, vals))| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i), &Quartiles::new(vals))
                .width(24)
                .style(palette_color(i))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_heatmap(root: &Area, table: &Table, title: &str) -> Result<(), RenderError> {
    let (names, matrix) = correlation_matrix(table)
        .ok_or_else(|| unsupported("heatmap", "requires at least 2 numeric columns"))?;
    let k = names.len();

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d(0f64..k as f64, 0f64..k as f64)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k)
        .y_labels(k)
        .x_label_formatter(&|x: &f64| label_at(&names, *x))
        .y_label_formatter(&|y: &f64| label_at(&names, *y))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series((0..k).flat_map(|i| {
            let row = &matrix[i];
            (0..k).map(move |j| {
                Rectangle::new(
                    [(j as f64, i as f64), (j as f64 + 1.0, i as f64 + 1.0)],
                    correlation_color(row[j]).filled(),
                )
            })
        }))
        .map_err(draw_err)?;

    chart
        .draw_series((0..k).flat_map(|i| {
            let row = matrix[i].clone();
            (0..k).map(move |j| {
                Text::new(
                    format!("{:.2}", row[j]),
                    (j as f64 + 0.38, i as f64 + 0.55),
                    ("sans-serif", 16).into_font().color(&BLACK),
                )
            })
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn label_at(names: &[String], coord: f64) -> String {
    let i = coord.floor();
    if (coord - i - 0.5).abs() < 0.5 {
        names.get(i as usize).cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

/// Diverging blue→white→red map over [-1, 1].
fn correlation_color(v: f64) -> RGBColor {
    let v = v.clamp(-1.0, 1.0);
    let blend = |a: u8, b: u8, t: f64| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    if v < 0.0 {
        let t = v + 1.0; // 0 at -1, 1 at 0
        RGBColor(blend(59, 255, t), blend(76, 255, t), blend(192, 255, t))
    } else {
        RGBColor(blend(255, 180, v), blend(255, 4, v), blend(255, 38, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Table};

    fn col(name: &str, vals: &[&str]) -> Column {
        Column::new(name, vals.iter().map(|v| Some(v.to_string())).collect())
    }

    fn sales_table() -> Table {
        Table::new(vec![
            col("region", &["A", "B", "A", "C"]),
            col("sales", &["10", "20", "15", "5"]),
        ])
        .unwrap()
    }

    #[test]
    fn bar_groups_compute_means_in_first_appearance_order() {
        let groups = bar_groups(&sales_table()).unwrap();
        assert_eq!(
            groups,
            vec![("A".to_string(), 12.5), ("B".to_string(), 20.0), ("C".to_string(), 5.0)]
        );
    }

    #[test]
    fn correlation_matrix_is_square_bounded_and_unit_diagonal() {
        let t = Table::new(vec![
            col("a", &["1", "2", "3", "4"]),
            col("b", &["2", "4", "6", "8"]),
            col("c", &["4", "3", "2", "1"]),
        ])
        .unwrap();
        let (names, m) = correlation_matrix(&t).unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(m.len(), 3);
        for (i, row) in m.iter().enumerate() {
            assert_eq!(row.len(), 3);
            assert_eq!(row[i], 1.0);
            for &v in row {
                assert!((-1.0..=1.0).contains(&v), "{v}");
            }
        }
        // b is a perfect positive, c a perfect negative correlate of a
        assert!((m[0][1] - 1.0).abs() < 1e-9);
        assert!((m[0][2] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_needs_two_numeric_columns() {
        assert!(correlation_matrix(&sales_table()).is_none());
    }

    #[test]
    fn heatmap_on_narrow_table_is_unsupported() {
        let err = render_chart(&sales_table(), ChartType::Heatmap, "heatmap").unwrap_err();
        assert!(matches!(err, RenderError::Unsupported { .. }), "{err}");
        assert!(err.to_string().contains("2 numeric columns"), "{err}");
    }

    #[test]
    fn value_counts_rank_by_frequency() {
        let c = col("x", &["a", "b", "a", "c", "a", "b"]);
        assert_eq!(
            value_counts(&c, 2),
            vec![("a".to_string(), 3), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn histogram_bins_cover_the_range() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let bins = histogram_bins(&values, 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), values.len());
        assert_eq!(bins[0].0, 0.0);
        assert_eq!(bins[19].1, 9.0);
    }

    #[test]
    fn constant_values_collapse_to_one_bin() {
        let bins = histogram_bins(&[5.0, 5.0, 5.0], 20);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].2, 3);
    }

    #[test]
    fn every_supported_chart_renders_on_a_rich_table() {
        let t = Table::new(vec![
            col("region", &["A", "B", "A", "C", "B"]),
            col("sales", &["10", "20", "15", "5", "12"]),
            col("profit", &["1", "4", "2", "0", "3"]),
        ])
        .unwrap();
        for chart_type in [
            ChartType::BarChart,
            ChartType::LineChart,
            ChartType::ScatterPlot,
            ChartType::PieChart,
            ChartType::Histogram,
            ChartType::BoxPlot,
            ChartType::Heatmap,
        ] {
            let out = render_chart(&t, chart_type, "test query").unwrap();
            assert_eq!(out.chart_type, chart_type);
            assert!(!out.image_base64.is_empty());
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let t = sales_table();
        let a = render_chart(&t, ChartType::BarChart, "bar of sales").unwrap();
        let b = render_chart(&t, ChartType::BarChart, "bar of sales").unwrap();
        assert_eq!(a.image_base64, b.image_base64);
    }
}
