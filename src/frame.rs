use anyhow::{anyhow, bail, Result};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

/// A single cell in a tabular dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Type a raw cell the way a spreadsheet import would:
    /// empty -> Missing, parses as a number -> Number, anything else -> Text.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Missing;
        }
        match raw.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn text(s: &str) -> Self {
        Value::Text(s.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Display form: integral numbers drop the decimal point (a year cell
    /// shows as "2020", not "2020.0"); missing shows as empty.
    pub fn display(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

/// Format a number the way a spreadsheet cell shows it.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Ordering used for sorting rows and distinct values: numbers first
/// (ascending), then text (lexicographic), missing last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Missing, Value::Missing) => Ordering::Equal,
        (Value::Missing, _) => Ordering::Greater,
        (_, Value::Missing) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Number(_), Value::Text(_)) => Ordering::Less,
        (Value::Text(_), Value::Number(_)) => Ordering::Greater,
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
    }
}

/// A tabular dataset: named columns over rows of scalar values.
/// Every row holds exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "Row {} has {} values but the frame has {} columns",
                    idx + 1,
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a frame from a JSON array of objects. Column order follows the
    /// first object; absent fields and nulls become Missing. An empty array
    /// yields an empty frame.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Ok(Frame::default());
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let columns: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::new();
            for column in &columns {
                let value = match obj.get(column) {
                    Some(JsonValue::String(s)) => Value::Text(s.clone()),
                    Some(JsonValue::Number(n)) => {
                        Value::Number(n.as_f64().ok_or_else(|| {
                            anyhow!("Number in field '{}' does not fit an f64", column)
                        })?)
                    }
                    Some(JsonValue::Bool(b)) => Value::Text(b.to_string()),
                    Some(JsonValue::Null) | None => Value::Missing,
                    _ => bail!("Unsupported value type for field '{}'", column),
                };
                row.push(value);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Internal constructor for operations that already preserve the
    /// row/column widths and must not be able to fail.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when either axis is empty (no rows or no columns).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Values of one column, top to bottom. None when the column is absent.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Copy with rows reordered by the named column. Unknown columns leave
    /// the row order untouched. The sort is stable.
    pub fn sorted_by(&self, column: &str) -> Self {
        let Some(idx) = self.column_index(column) else {
            return self.clone();
        };
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| compare_values(&a[idx], &b[idx]));
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Copy keeping only the rows the predicate accepts. Row order is
    /// preserved.
    pub fn retain_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&[Value]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }
}
