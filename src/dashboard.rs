// One dashboard cycle: fetch the spreadsheet, report schema problems,
// apply the dimension filters, aggregate the money columns and build the
// four panels. Rendering to disk is optional; the descriptors and the
// summary are produced either way.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{DashboardConfig, Schema};
use crate::figure::{ColumnRef, Figure};
use crate::filter::{apply_filters, DimensionFilter};
use crate::frame::Frame;
use crate::metrics::{summarize, Aggregate};
use crate::notify::Notifier;
use crate::plot::{self, AreaParams, BarParams, LineParams, PieParams};
use crate::prepare;
use crate::render;
use crate::source::open_source;

/// Outcome of one cycle: the filtered rows, the metric cards, which
/// panels were built or skipped, and the files written when rendering
/// was enabled.
#[derive(Debug)]
pub struct DashboardSummary {
    /// Normalized, filtered rows the aggregates and panels were computed
    /// over. The table view of the dashboard.
    pub frame: Frame,
    pub aggregates: Vec<Aggregate>,
    pub built: Vec<String>,
    pub skipped: Vec<String>,
    pub written: Vec<PathBuf>,
    pub schema_ok: bool,
}

/// Fetch and normalize the configured spreadsheet.
pub fn load_spreadsheet(config: &DashboardConfig) -> Result<Frame> {
    let frame = open_source(&config.spreadsheet).fetch()?;
    Ok(prepare::normalize(&frame))
}

/// Run one dashboard cycle. Source failures propagate; a panel whose
/// columns are missing is reported and skipped without stopping the rest.
pub fn run(
    config: &DashboardConfig,
    filters: &[DimensionFilter],
    out_dir: Option<&Path>,
    notifier: &dyn Notifier,
) -> Result<DashboardSummary> {
    let frame = load_spreadsheet(config)?;
    let schema = &config.schema;

    // Schema problems are reported once, against the unfiltered sheet
    let schema_ok = prepare::validate(&frame, &schema.expected_columns(), notifier);

    let frame = apply_filters(&frame, filters);
    let aggregates = summarize(&frame, schema);

    let mut figures: Vec<(String, Figure)> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();

    let pie = PieParams {
        values: Some(schema.paid.clone()),
        color: Some(schema.tax.clone()),
        title: "Distribuição de tributos".to_string(),
        ..PieParams::new(&schema.tax)
    };
    collect(
        "distribuicao_tributos",
        plot::pie_plot(&frame, &pie, notifier)?,
        &mut figures,
        &mut skipped,
    );

    let by_year = frame.sorted_by(&schema.year);
    let line = LineParams {
        title: "Evolução de pagamentos".to_string(),
        ..LineParams::new(ColumnRef::Named(schema.year.clone()), &schema.paid)
    };
    collect(
        "evolucao_pagamentos",
        plot::line_plot(&by_year, &line, notifier)?,
        &mut figures,
        &mut skipped,
    );

    let bar = BarParams {
        color: "light blue".to_string(),
        title: "Pagamentos por ano".to_string(),
        ..BarParams::new(&schema.year, &schema.paid)
    };
    collect(
        "pagamentos_por_ano",
        plot::bar_plot(&frame, &bar, notifier)?,
        &mut figures,
        &mut skipped,
    );

    let area = AreaParams {
        title: "Líquido a receber por tributo".to_string(),
        ..AreaParams::new(&schema.year, &schema.net, &schema.tax)
    };
    collect(
        "liquido_por_tributo",
        plot::area_plot(&frame, &area, notifier)?,
        &mut figures,
        &mut skipped,
    );

    let mut written: Vec<PathBuf> = Vec::new();
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
        for (slug, figure) in &figures {
            let rendered = render::render(figure, &config.render)
                .with_context(|| format!("Failed to render panel '{}'", slug))?;
            let path = dir.join(format!("{}.{}", slug, rendered.extension()));
            fs::write(&path, rendered.bytes())
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!("Wrote {}", path.display());
            written.push(path);
        }
    }

    let built = figures.into_iter().map(|(slug, _)| slug).collect();
    Ok(DashboardSummary {
        frame,
        aggregates,
        built,
        skipped,
        written,
        schema_ok,
    })
}

fn collect(
    slug: &str,
    figure: Option<Figure>,
    figures: &mut Vec<(String, Figure)>,
    skipped: &mut Vec<String>,
) {
    match figure {
        Some(f) => {
            debug!("Built {} panel '{}'", f.kind.name(), slug);
            figures.push((slug.to_string(), f));
        }
        None => skipped.push(slug.to_string()),
    }
}

/// Plain-text table of the filtered rows: schema columns present in the
/// frame, in sheet order, cells in display form, one padded line per row
/// with a dash rule under the header. Empty when none of the schema
/// columns exist.
pub fn format_table(frame: &Frame, schema: &Schema) -> String {
    let columns: Vec<String> = schema
        .expected_columns()
        .into_iter()
        .filter(|name| frame.has_column(name))
        .collect();
    if columns.is_empty() {
        return String::new();
    }
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|name| frame.column_index(name))
        .collect();

    let table_rows: Vec<Vec<String>> = frame
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&idx| row[idx].display()).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|name| name.chars().count()).collect();
    for row in &table_rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut lines = Vec::with_capacity(table_rows.len() + 2);
    lines.push(padded_line(&columns, &widths));
    lines.push(padded_line(&rule, &widths));
    for row in &table_rows {
        lines.push(padded_line(row, &widths));
    }
    lines.join("\n")
}

fn padded_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, &width)| format!("{:<width$}", cell))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Format a value as Brazilian currency: thousands '.', decimal ','.
pub fn format_brl(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("R$ {}{},{:02}", sign, grouped, fraction)
}
