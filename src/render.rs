// Drawing backend for prepared figures. Bars aggregate y per category,
// lines and areas split into one series per color-column value, pies
// weight slices by the values column (or by row count). PNG output goes
// through an RGB buffer and the image encoder; SVG renders to a string.

use anyhow::{anyhow, bail, Context, Result};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::collections::HashMap;
use std::ops::Range;

use crate::figure::{ChartKind, ColumnRef, Figure};
use crate::frame::{Frame, Value};
use crate::palette::{parse_color, ColorPalette};
use crate::prepare::parse_numeric_or_zero;
use crate::{OutputFormat, RenderOptions};

/// A rendered chart artifact.
#[derive(Debug, Clone)]
pub enum Rendered {
    Png(Vec<u8>),
    Svg(String),
}

impl Rendered {
    pub fn extension(&self) -> &'static str {
        match self {
            Rendered::Png(_) => "png",
            Rendered::Svg(_) => "svg",
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Rendered::Png(bytes) => bytes,
            Rendered::Svg(text) => text.as_bytes(),
        }
    }
}

/// Render a figure with the given options.
pub fn render(figure: &Figure, options: &RenderOptions) -> Result<Rendered> {
    match options.format {
        OutputFormat::Png => render_png(figure, options.width, options.height).map(Rendered::Png),
        OutputFormat::Svg => render_svg(figure, options.width, options.height).map(Rendered::Svg),
    }
}

fn render_png(figure: &Figure, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_figure(&root, figure)?;
    }

    let mut png_bytes: Vec<u8> = Vec::new();
    {
        let encoder = PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, ColorType::Rgb8)
            .context("Failed to encode PNG image")?;
    }
    Ok(png_bytes)
}

fn render_svg(figure: &Figure, width: u32, height: u32) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_figure(&root, figure)?;
    }
    Ok(svg)
}

fn draw_figure<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to fill background: {}", e))?;

    match figure.kind {
        ChartKind::Bar => draw_bar(root, figure)?,
        ChartKind::Line => draw_line(root, figure)?,
        ChartKind::Pie => draw_pie(root, figure)?,
        ChartKind::Area => draw_area(root, figure)?,
    }

    root.present()
        .map_err(|e| anyhow!("Failed to present drawing: {}", e))?;
    Ok(())
}

fn draw_bar<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    let x_name = named_x(figure).ok_or_else(|| anyhow!("Bar figure is missing its x binding"))?;
    let y_name = figure
        .y
        .as_deref()
        .ok_or_else(|| anyhow!("Bar figure is missing its y binding"))?;

    let categories = column_display(&figure.data, x_name)?;
    let values = column_numbers(&figure.data, y_name)?;
    let (categories, sums) = sum_by_category(&categories, &values);
    if categories.is_empty() {
        bail!("Bar figure has no rows to draw");
    }

    // The y axis always includes the zero baseline the bars grow from
    let y_min = sums.iter().copied().fold(0.0f64, f64::min);
    let y_max = sums.iter().copied().fold(0.0f64, f64::max);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&figure.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..(categories.len() as f64), padded_range(y_min, y_max))
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    let labels = categories.clone();
    chart
        .configure_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| {
            let idx = *x as usize;
            if idx < labels.len() {
                labels[idx].clone()
            } else {
                String::new()
            }
        })
        .x_desc(x_name)
        .y_desc(y_name)
        .draw()
        .map_err(|e| anyhow!("Failed to draw mesh: {}", e))?;

    let color = parse_color(figure.fill.as_deref().unwrap_or(""));
    let bar_width = 0.8;
    for (idx, &value) in sums.iter().enumerate() {
        let x_center = idx as f64 + 0.5;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, value),
                ],
                color.filled(),
            )))
            .map_err(|e| anyhow!("Failed to draw bar: {}", e))?;
    }

    Ok(())
}

fn draw_line<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    let y_name = figure
        .y
        .as_deref()
        .ok_or_else(|| anyhow!("Line figure is missing its y binding"))?;
    let xs = figure
        .x_values()
        .ok_or_else(|| anyhow!("Line figure is missing its x binding"))?;
    let ys = column_numbers(&figure.data, y_name)?;
    if xs.is_empty() {
        bail!("Line figure has no rows to draw");
    }
    if xs.len() != ys.len() {
        bail!(
            "X and Y data must have the same length (x: {}, y: {})",
            xs.len(),
            ys.len()
        );
    }

    // A fully numeric x side gets a continuous axis; anything else is
    // drawn against category positions in first-appearance order.
    let categories = if xs.iter().all(Value::is_number) {
        None
    } else {
        Some(category_order(&xs))
    };
    let xs_f: Vec<f64> = match &categories {
        None => xs.iter().map(|v| v.as_number().unwrap_or(0.0)).collect(),
        Some(cats) => {
            let index: HashMap<&str, f64> = cats
                .iter()
                .enumerate()
                .map(|(i, c)| (c.as_str(), i as f64))
                .collect();
            xs.iter().map(|v| index[v.display().as_str()]).collect()
        }
    };

    let keys = group_keys(figure)?;
    let series_list = build_series(&xs_f, &ys, &keys);

    let (x_min, x_max) = min_max(xs_f.iter().copied());
    let (y_min, y_max) = min_max(ys.iter().copied());

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&figure.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(padded_range(x_min, x_max), padded_range(y_min, y_max))
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    let x_label = named_x(figure).unwrap_or("");
    let labels = categories.clone().unwrap_or_default();
    let formatter = |x: &f64| {
        let idx = *x as usize;
        if idx < labels.len() {
            labels[idx].clone()
        } else {
            String::new()
        }
    };
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(x_label).y_desc(y_name);
        if categories.is_some() {
            mesh.x_labels(labels.len()).x_label_formatter(&formatter);
        }
        mesh.draw()
            .map_err(|e| anyhow!("Failed to draw mesh: {}", e))?;
    }

    let with_legend = figure.color.is_some();
    for series in &series_list {
        let color = series.color;
        let anno = chart
            .draw_series(LineSeries::new(
                series.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(|e| anyhow!("Failed to draw line series: {}", e))?;
        if with_legend {
            anno.label(&series.key).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
        }
    }

    if with_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| anyhow!("Failed to draw legend: {}", e))?;
    }

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    let names_col = figure
        .names
        .as_deref()
        .ok_or_else(|| anyhow!("Pie figure is missing its names binding"))?;
    let names = column_display(&figure.data, names_col)?;
    let weights = match figure.values.as_deref() {
        Some(col) => column_numbers(&figure.data, col)?,
        None => vec![1.0; names.len()],
    };
    let (labels, sizes) = sum_by_category(&names, &weights);

    // A slice needs a positive angle
    let mut kept_labels: Vec<String> = Vec::new();
    let mut kept_sizes: Vec<f64> = Vec::new();
    for (label, size) in labels.iter().zip(sizes.iter()) {
        if *size > 0.0 {
            kept_labels.push(label.clone());
            kept_sizes.push(*size);
        }
    }
    if kept_labels.is_empty() {
        bail!("Pie figure has no positive values to draw");
    }

    let area = root
        .titled(&figure.title, ("sans-serif", 20))
        .map_err(|e| anyhow!("Failed to draw title: {}", e))?;

    let palette = ColorPalette::category10().assign_colors(&kept_labels);
    let colors: Vec<RGBColor> = kept_labels
        .iter()
        .map(|label| parse_color(palette.get(label).map(String::as_str).unwrap_or("")))
        .collect();

    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    let radius = f64::from(width.min(height)) * 0.35;
    let mut pie = Pie::new(&center, &radius, &kept_sizes, &colors, &kept_labels);
    pie.label_style(("sans-serif", 15).into_font().color(&BLACK));
    area.draw(&pie)
        .map_err(|e| anyhow!("Failed to draw pie: {}", e))?;

    Ok(())
}

fn draw_area<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    let x_name = named_x(figure).ok_or_else(|| anyhow!("Area figure is missing its x binding"))?;
    let y_name = figure
        .y
        .as_deref()
        .ok_or_else(|| anyhow!("Area figure is missing its y binding"))?;
    let color_name = figure
        .color
        .as_deref()
        .ok_or_else(|| anyhow!("Area figure is missing its color binding"))?;

    let xs = figure
        .x_values()
        .ok_or_else(|| anyhow!("Area figure is missing its x binding"))?;
    let ys = column_numbers(&figure.data, y_name)?;
    let keys = column_display(&figure.data, color_name)?;
    if xs.is_empty() {
        bail!("Area figure has no rows to draw");
    }
    if xs.len() != ys.len() {
        bail!(
            "X and Y data must have the same length (x: {}, y: {})",
            xs.len(),
            ys.len()
        );
    }

    let categories = category_order(&xs);
    let category_index: HashMap<String, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect();

    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for ((x, y), key) in xs.iter().zip(ys.iter()).zip(keys.iter()) {
        let slot = groups
            .entry(key.clone())
            .or_insert_with(|| vec![0.0; categories.len()]);
        slot[category_index[&x.display()]] += *y;
    }

    let mut sorted_keys: Vec<String> = groups.keys().cloned().collect();
    sorted_keys.sort();
    let palette = ColorPalette::category10().assign_colors(&sorted_keys);

    // Each band sits on the cumulative total of the bands below it
    let mut offsets = vec![0.0f64; categories.len()];
    let mut bands: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();
    for key in &sorted_keys {
        let lower = offsets.clone();
        let upper: Vec<f64> = lower
            .iter()
            .zip(groups[key].iter())
            .map(|(l, v)| l + v)
            .collect();
        bands.push((key.clone(), lower, upper.clone()));
        offsets = upper;
    }

    let (y_min, y_max) = min_max(
        bands
            .iter()
            .flat_map(|(_, lower, upper)| lower.iter().chain(upper.iter()).copied())
            .chain(std::iter::once(0.0)),
    );
    let x_max = (categories.len() - 1) as f64;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&figure.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(padded_range(0.0, x_max), padded_range(y_min, y_max))
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    let labels = categories.clone();
    chart
        .configure_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| {
            let idx = *x as usize;
            if idx < labels.len() {
                labels[idx].clone()
            } else {
                String::new()
            }
        })
        .x_desc(x_name)
        .y_desc(y_name)
        .draw()
        .map_err(|e| anyhow!("Failed to draw mesh: {}", e))?;

    for (key, lower, upper) in &bands {
        let color = parse_color(palette.get(key).map(String::as_str).unwrap_or(""));
        let mut points: Vec<(f64, f64)> = upper
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        for (i, v) in lower.iter().enumerate().rev() {
            points.push((i as f64, *v));
        }
        chart
            .draw_series(std::iter::once(Polygon::new(points, color.mix(0.6).filled())))
            .map_err(|e| anyhow!("Failed to draw area band: {}", e))?
            .label(key)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.6).filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| anyhow!("Failed to draw legend: {}", e))?;

    Ok(())
}

struct Series {
    key: String,
    points: Vec<(f64, f64)>,
    color: RGBColor,
}

fn build_series(xs: &[f64], ys: &[f64], keys: &[String]) -> Vec<Series> {
    let mut grouped: HashMap<String, Vec<(f64, f64)>> = HashMap::new();
    for ((x, y), key) in xs.iter().zip(ys.iter()).zip(keys.iter()) {
        grouped.entry(key.clone()).or_default().push((*x, *y));
    }

    let mut sorted_keys: Vec<String> = grouped.keys().cloned().collect();
    sorted_keys.sort();
    let palette = ColorPalette::category10().assign_colors(&sorted_keys);

    sorted_keys
        .into_iter()
        .map(|key| {
            let points = grouped.remove(&key).unwrap_or_default();
            let color = parse_color(palette.get(&key).map(String::as_str).unwrap_or(""));
            Series { key, points, color }
        })
        .collect()
}

fn group_keys(figure: &Figure) -> Result<Vec<String>> {
    match figure.color.as_deref() {
        Some(name) => column_display(&figure.data, name),
        None => Ok(vec![String::new(); figure.data.row_count()]),
    }
}

fn named_x(figure: &Figure) -> Option<&str> {
    match &figure.x {
        Some(ColumnRef::Named(name)) => Some(name.as_str()),
        _ => None,
    }
}

fn column_numbers(frame: &Frame, name: &str) -> Result<Vec<f64>> {
    frame
        .column_values(name)
        .map(|values| values.into_iter().map(parse_numeric_or_zero).collect())
        .ok_or_else(|| anyhow!("Column '{}' not found", name))
}

fn column_display(frame: &Frame, name: &str) -> Result<Vec<String>> {
    frame
        .column_values(name)
        .map(|values| values.into_iter().map(Value::display).collect())
        .ok_or_else(|| anyhow!("Column '{}' not found", name))
}

fn padded_range(min: f64, max: f64) -> Range<f64> {
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Aggregate values by category (sum), preserving first-appearance order.
fn sum_by_category(categories: &[String], values: &[f64]) -> (Vec<String>, Vec<f64>) {
    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (category, value) in categories.iter().zip(values.iter()) {
        if !totals.contains_key(category) {
            order.push(category.clone());
        }
        *totals.entry(category.clone()).or_insert(0.0) += value;
    }

    let sums = order.iter().map(|c| totals[c]).collect();
    (order, sums)
}

fn category_order(values: &[Value]) -> Vec<String> {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut order = Vec::new();
    for value in values {
        let display = value.display();
        if seen.insert(display.clone(), ()).is_none() {
            order.push(display);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::BufferNotifier;
    use crate::plot::{area_plot, bar_plot, line_plot, pie_plot};
    use crate::plot::{AreaParams, BarParams, LineParams, PieParams};

    const PNG_MAGIC: [u8; 4] = [137, 80, 78, 71];

    fn make_frame() -> Frame {
        Frame::new(
            vec![
                "ano_base".to_string(),
                "total_pago".to_string(),
                "tributo".to_string(),
            ],
            vec![
                vec![Value::Number(2020.0), Value::text("100"), Value::text("PIS")],
                vec![Value::Number(2021.0), Value::text("200"), Value::text("COFINS")],
                vec![Value::Number(2022.0), Value::text("300"), Value::text("PIS")],
            ],
        )
        .unwrap()
    }

    fn png_options() -> RenderOptions {
        RenderOptions {
            width: 400,
            height: 300,
            format: OutputFormat::Png,
        }
    }

    #[test]
    fn test_render_bar_png() {
        let notifier = BufferNotifier::new();
        let figure = bar_plot(&make_frame(), &BarParams::new("ano_base", "total_pago"), &notifier)
            .unwrap()
            .unwrap();
        let rendered = render(&figure, &png_options()).unwrap();
        assert_eq!(rendered.extension(), "png");
        match rendered {
            Rendered::Png(bytes) => assert!(bytes.starts_with(&PNG_MAGIC)),
            Rendered::Svg(_) => panic!("Expected PNG output"),
        }
    }

    #[test]
    fn test_render_line_svg() {
        let notifier = BufferNotifier::new();
        let params = LineParams {
            color: Some("tributo".to_string()),
            ..LineParams::new(ColumnRef::named("ano_base"), "total_pago")
        };
        let figure = line_plot(&make_frame(), &params, &notifier).unwrap().unwrap();
        let options = RenderOptions {
            width: 400,
            height: 300,
            format: OutputFormat::Svg,
        };
        let rendered = render(&figure, &options).unwrap();
        assert_eq!(rendered.extension(), "svg");
        match rendered {
            Rendered::Svg(text) => assert!(text.contains("<svg")),
            Rendered::Png(_) => panic!("Expected SVG output"),
        }
    }

    #[test]
    fn test_render_line_literal_x_numeric_axis() {
        let notifier = BufferNotifier::new();
        let literal = vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)];
        let figure = line_plot(
            &make_frame(),
            &LineParams::new(ColumnRef::Literal(literal), "total_pago"),
            &notifier,
        )
        .unwrap()
        .unwrap();
        let rendered = render(&figure, &png_options()).unwrap();
        assert!(rendered.bytes().starts_with(&PNG_MAGIC));
    }

    #[test]
    fn test_render_pie_png() {
        let notifier = BufferNotifier::new();
        let params = PieParams {
            values: Some("total_pago".to_string()),
            ..PieParams::new("tributo")
        };
        let figure = pie_plot(&make_frame(), &params, &notifier).unwrap().unwrap();
        let rendered = render(&figure, &png_options()).unwrap();
        assert!(rendered.bytes().starts_with(&PNG_MAGIC));
    }

    #[test]
    fn test_render_pie_without_positive_values_fails() {
        let frame = Frame::new(
            vec!["tributo".to_string(), "total_pago".to_string()],
            vec![
                vec![Value::text("PIS"), Value::text("abc")],
                vec![Value::text("COFINS"), Value::text("xyz")],
            ],
        )
        .unwrap();
        let notifier = BufferNotifier::new();
        let params = PieParams {
            values: Some("total_pago".to_string()),
            ..PieParams::new("tributo")
        };
        let figure = pie_plot(&frame, &params, &notifier).unwrap().unwrap();
        let error = render(&figure, &png_options()).unwrap_err();
        assert!(error.to_string().contains("no positive values"));
    }

    #[test]
    fn test_render_area_png() {
        let notifier = BufferNotifier::new();
        let figure = area_plot(
            &make_frame(),
            &AreaParams::new("ano_base", "total_pago", "tributo"),
            &notifier,
        )
        .unwrap()
        .unwrap();
        let rendered = render(&figure, &png_options()).unwrap();
        assert!(rendered.bytes().starts_with(&PNG_MAGIC));
    }

    #[test]
    fn test_render_area_literal_x_length_mismatch_fails() {
        // Figures are plain data; a caller can bind a literal x directly
        // without going through the builder's arity check.
        let figure = Figure {
            kind: ChartKind::Area,
            data: make_frame(),
            x: Some(ColumnRef::Literal(vec![
                Value::Number(1.0),
                Value::Number(2.0),
            ])),
            y: Some("total_pago".to_string()),
            names: None,
            values: None,
            color: Some("tributo".to_string()),
            fill: None,
            title: String::new(),
        };
        let error = render(&figure, &png_options()).unwrap_err();
        assert!(error.to_string().contains("same length (x: 2, y: 3)"));
    }

    #[test]
    fn test_sum_by_category_first_appearance_order() {
        let categories = vec![
            "PIS".to_string(),
            "COFINS".to_string(),
            "PIS".to_string(),
        ];
        let values = vec![100.0, 200.0, 300.0];
        let (order, sums) = sum_by_category(&categories, &values);
        assert_eq!(order, vec!["PIS".to_string(), "COFINS".to_string()]);
        assert_eq!(sums, vec![400.0, 200.0]);
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range(0.0, 100.0);
        assert_eq!(range.start, -5.0);
        assert_eq!(range.end, 105.0);

        let flat = padded_range(42.0, 42.0);
        assert_eq!(flat.start, 41.0);
        assert_eq!(flat.end, 43.0);
    }
}
