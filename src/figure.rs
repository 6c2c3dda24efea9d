use crate::frame::{Frame, Value};

/// Chart kinds the dashboard knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Area,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Area => "area",
        }
    }
}

/// An x binding: either a column of the dataset or a literal value
/// sequence supplied by the caller in row order.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Named(String),
    Literal(Vec<Value>),
}

impl ColumnRef {
    pub fn named(name: &str) -> Self {
        ColumnRef::Named(name.to_string())
    }
}

/// A fully prepared chart description: kind, the prepared data copy, and
/// the resolved bindings. Building one draws nothing; any renderer can
/// consume it.
#[derive(Debug, Clone)]
pub struct Figure {
    pub kind: ChartKind,
    pub data: Frame,
    pub x: Option<ColumnRef>,
    pub y: Option<String>,
    pub names: Option<String>,
    pub values: Option<String>,
    /// Grouping column: one series/slice color per distinct value.
    pub color: Option<String>,
    /// Fixed fill color for kinds without a grouping column.
    pub fill: Option<String>,
    pub title: String,
}

impl Figure {
    /// X values in row order, whether bound to a column or supplied
    /// literally.
    pub fn x_values(&self) -> Option<Vec<Value>> {
        match &self.x {
            Some(ColumnRef::Named(name)) => self
                .data
                .column_values(name)
                .map(|values| values.into_iter().cloned().collect()),
            Some(ColumnRef::Literal(values)) => Some(values.clone()),
            None => None,
        }
    }
}
