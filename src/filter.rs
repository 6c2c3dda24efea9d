use crate::frame::{compare_values, Frame, Value};
use std::collections::HashSet;
use tracing::warn;

/// One choice on a filter dimension: everything, or a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    Only(String),
}

/// An equality filter over one column.
#[derive(Debug, Clone)]
pub struct DimensionFilter {
    pub column: String,
    pub selection: Selection,
}

impl DimensionFilter {
    pub fn new(column: &str, selection: Selection) -> Self {
        Self {
            column: column.to_string(),
            selection,
        }
    }
}

/// Distinct display values of a column, sorted (numbers ascending, then
/// text), duplicates and missing dropped. Empty when the column is absent.
/// These are the concrete options behind each dimension's "all" choice.
pub fn distinct_values(frame: &Frame, column: &str) -> Vec<String> {
    let Some(values) = frame.column_values(column) else {
        return Vec::new();
    };

    let mut present: Vec<&Value> = values.into_iter().filter(|v| !v.is_missing()).collect();
    present.sort_by(|a, b| compare_values(a, b));

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in present {
        let display = value.display();
        if seen.insert(display.clone()) {
            out.push(display);
        }
    }
    out
}

/// Keep rows whose display value equals the selection for every non-All
/// filter. Row order is preserved. A filter naming an absent column is
/// ignored with a warning (the schema report has already named it).
pub fn apply_filters(frame: &Frame, filters: &[DimensionFilter]) -> Frame {
    let mut result = frame.clone();
    for filter in filters {
        let Selection::Only(wanted) = &filter.selection else {
            continue;
        };
        let Some(idx) = result.column_index(&filter.column) else {
            warn!(
                "Filter column '{}' not present, ignoring this filter",
                filter.column
            );
            continue;
        };
        result = result.retain_rows(|row| row[idx].display() == *wanted);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame() -> Frame {
        Frame::new(
            vec!["ano_base".to_string(), "tributo".to_string()],
            vec![
                vec![Value::Number(2022.0), Value::text("PIS")],
                vec![Value::Number(2014.0), Value::text("COFINS")],
                vec![Value::Number(2022.0), Value::text("COFINS")],
                vec![Value::Missing, Value::text("ISS")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_distinct_values_sorted_without_missing() {
        assert_eq!(distinct_values(&make_frame(), "ano_base"), vec!["2014", "2022"]);
        assert_eq!(
            distinct_values(&make_frame(), "tributo"),
            vec!["COFINS", "ISS", "PIS"]
        );
    }

    #[test]
    fn test_distinct_values_numeric_order() {
        let frame = Frame::new(
            vec!["prazo".to_string()],
            vec![
                vec![Value::Number(12.0)],
                vec![Value::Number(2.0)],
                vec![Value::Number(12.0)],
            ],
        )
        .unwrap();
        // Numeric, not lexicographic
        assert_eq!(distinct_values(&frame, "prazo"), vec!["2", "12"]);
    }

    #[test]
    fn test_distinct_values_absent_column() {
        assert!(distinct_values(&make_frame(), "setor").is_empty());
    }

    #[test]
    fn test_apply_filters_all_keeps_everything() {
        let frame = make_frame();
        let filters = vec![
            DimensionFilter::new("ano_base", Selection::All),
            DimensionFilter::new("tributo", Selection::All),
        ];
        assert_eq!(apply_filters(&frame, &filters), frame);
    }

    #[test]
    fn test_apply_filters_single_dimension() {
        let filters = vec![DimensionFilter::new(
            "ano_base",
            Selection::Only("2022".to_string()),
        )];
        let filtered = apply_filters(&make_frame(), &filters);
        assert_eq!(filtered.row_count(), 2);
    }

    #[test]
    fn test_apply_filters_both_dimensions() {
        let filters = vec![
            DimensionFilter::new("ano_base", Selection::Only("2022".to_string())),
            DimensionFilter::new("tributo", Selection::Only("COFINS".to_string())),
        ];
        let filtered = apply_filters(&make_frame(), &filters);
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(filtered.rows()[0][1], Value::text("COFINS"));
    }

    #[test]
    fn test_apply_filters_absent_column_ignored() {
        let filters = vec![DimensionFilter::new(
            "setor",
            Selection::Only("TI".to_string()),
        )];
        assert_eq!(apply_filters(&make_frame(), &filters).row_count(), 4);
    }
}
