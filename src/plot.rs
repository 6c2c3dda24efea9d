// Chart construction. Every builder runs the same front half (normalize,
// trim bindings, validate required columns) and returns Ok(None) when the
// dataset cannot support the chart; the validation report goes through the
// notifier. Only a literal x sequence of the wrong length is a hard error.

use anyhow::{bail, Result};

use crate::figure::{ChartKind, ColumnRef, Figure};
use crate::frame::Frame;
use crate::notify::Notifier;
use crate::prepare;

/// Default bar fill, the first color of the categorical palette.
pub const DEFAULT_BAR_COLOR: &str = "#1f77b4";

#[derive(Debug, Clone)]
pub struct BarParams {
    pub x: String,
    pub y: String,
    pub color: String,
    pub title: String,
}

impl BarParams {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            color: DEFAULT_BAR_COLOR.to_string(),
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineParams {
    pub x: ColumnRef,
    pub y: String,
    pub color: Option<String>,
    pub title: String,
}

impl LineParams {
    pub fn new(x: ColumnRef, y: &str) -> Self {
        Self {
            x,
            y: y.to_string(),
            color: None,
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PieParams {
    pub names: String,
    pub values: Option<String>,
    pub color: Option<String>,
    pub title: String,
}

impl PieParams {
    pub fn new(names: &str) -> Self {
        Self {
            names: names.to_string(),
            values: None,
            color: None,
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AreaParams {
    pub x: String,
    pub y: String,
    pub color: String,
    pub title: String,
}

impl AreaParams {
    pub fn new(x: &str, y: &str, color: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            color: color.to_string(),
            title: String::new(),
        }
    }
}

/// Bar chart over a categorical x column with a fixed fill color.
pub fn bar_plot(frame: &Frame, params: &BarParams, notifier: &dyn Notifier) -> Result<Option<Figure>> {
    let data = prepare::normalize(frame);
    let x = params.x.trim().to_string();
    let y = params.y.trim().to_string();

    let required = vec![x.clone(), y.clone()];
    if !prepare::validate(&data, &required, notifier) {
        return Ok(None);
    }

    Ok(Some(Figure {
        kind: ChartKind::Bar,
        data,
        x: Some(ColumnRef::Named(x)),
        y: Some(y),
        names: None,
        values: None,
        color: None,
        fill: Some(params.color.clone()),
        title: params.title.clone(),
    }))
}

/// Pie chart; without a values column each name is weighted by row count.
pub fn pie_plot(frame: &Frame, params: &PieParams, notifier: &dyn Notifier) -> Result<Option<Figure>> {
    let data = prepare::normalize(frame);
    let names = params.names.trim().to_string();
    let values = params.values.as_ref().map(|v| v.trim().to_string());
    let color = params.color.as_ref().map(|c| c.trim().to_string());

    let mut required = vec![names.clone()];
    if let Some(v) = &values {
        required.push(v.clone());
    }
    if !prepare::validate(&data, &required, notifier) {
        return Ok(None);
    }

    Ok(Some(Figure {
        kind: ChartKind::Pie,
        data,
        x: None,
        y: None,
        names: Some(names),
        values,
        color,
        fill: None,
        title: params.title.clone(),
    }))
}

/// Line chart. The x side may be a column name or a literal sequence; a
/// literal must match the row count exactly (no truncation, no wrapping).
pub fn line_plot(frame: &Frame, params: &LineParams, notifier: &dyn Notifier) -> Result<Option<Figure>> {
    let data = prepare::normalize(frame);
    let y = params.y.trim().to_string();
    let color = params.color.as_ref().map(|c| c.trim().to_string());

    let x = match &params.x {
        ColumnRef::Named(name) => ColumnRef::Named(name.trim().to_string()),
        ColumnRef::Literal(values) => ColumnRef::Literal(values.clone()),
    };

    // Report order is y, then color, then a named x
    let mut required = vec![y.clone()];
    if let Some(c) = &color {
        required.push(c.clone());
    }
    if let ColumnRef::Named(name) = &x {
        required.push(name.clone());
    }
    if !prepare::validate(&data, &required, notifier) {
        return Ok(None);
    }

    if let ColumnRef::Literal(values) = &x {
        if values.len() != data.row_count() {
            bail!(
                "Length mismatch: literal x sequence has {} values but the dataset has {} rows",
                values.len(),
                data.row_count()
            );
        }
    }

    let mut data = prepare::coerce_numeric(&data, &y);
    if let ColumnRef::Named(name) = &x {
        data = prepare::coerce_string(&data, name);
    }

    Ok(Some(Figure {
        kind: ChartKind::Line,
        data,
        x: Some(x),
        y: Some(y),
        names: None,
        values: None,
        color,
        fill: None,
        title: params.title.clone(),
    }))
}

/// Stacked area chart grouped by a color column.
pub fn area_plot(frame: &Frame, params: &AreaParams, notifier: &dyn Notifier) -> Result<Option<Figure>> {
    let data = prepare::normalize(frame);
    let x = params.x.trim().to_string();
    let y = params.y.trim().to_string();
    let color = params.color.trim().to_string();

    let required = vec![x.clone(), y.clone(), color.clone()];
    if !prepare::validate(&data, &required, notifier) {
        return Ok(None);
    }

    let data = prepare::coerce_string(&prepare::coerce_numeric(&data, &y), &x);

    Ok(Some(Figure {
        kind: ChartKind::Area,
        data,
        x: Some(ColumnRef::Named(x)),
        y: Some(y),
        names: None,
        values: None,
        color: Some(color),
        fill: None,
        title: params.title.clone(),
    }))
}
