// Data preparation ahead of chart construction: column-name normalization,
// required-column validation, and lenient type coercion.

use crate::frame::{Frame, Value};
use crate::notify::Notifier;
use tracing::debug;

/// Copy of the dataset with column names stripped of surrounding
/// whitespace. An empty dataset comes back empty. The input is never
/// mutated.
pub fn normalize(frame: &Frame) -> Frame {
    if frame.is_empty() {
        return Frame::default();
    }
    let columns = frame
        .columns()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    Frame::from_parts(columns, frame.rows().to_vec())
}

/// Check that the dataset is non-empty and carries every required column.
/// Problems go to the notifier ("dataset empty" as a warning, missing
/// columns as an error naming what is absent and what exists); the return
/// value says only whether the dataset is usable. Never fails.
pub fn validate(frame: &Frame, required: &[String], notifier: &dyn Notifier) -> bool {
    if frame.is_empty() {
        notifier.warn("Dataset is empty");
        return false;
    }

    let missing: Vec<&String> = required
        .iter()
        .filter(|name| !frame.has_column(name))
        .collect();

    if !missing.is_empty() {
        notifier.error(&format!(
            "Missing columns: {:?} (available columns: {:?})",
            missing,
            frame.columns()
        ));
        return false;
    }

    true
}

/// Copy of the dataset with every value in `column` parsed as a number;
/// unparseable values become 0. Unknown columns are left alone. Never
/// fails.
pub fn coerce_numeric(frame: &Frame, column: &str) -> Frame {
    let Some(idx) = frame.column_index(column) else {
        debug!("coerce_numeric: column '{}' not present, nothing to do", column);
        return frame.clone();
    };

    let mut fallbacks = 0usize;
    let mut rows = frame.rows().to_vec();
    for row in &mut rows {
        if matches!(&row[idx], Value::Text(s) if s.trim().parse::<f64>().is_err()) {
            fallbacks += 1;
        }
        row[idx] = Value::Number(parse_numeric_or_zero(&row[idx]));
    }

    if fallbacks > 0 {
        debug!(
            "coerce_numeric: {} of {} values in '{}' fell back to 0",
            fallbacks,
            rows.len(),
            column
        );
    }

    Frame::from_parts(frame.columns().to_vec(), rows)
}

/// Copy of the dataset with `column` converted to trimmed text, but only
/// when it holds non-textual values; an already-textual column (no numbers)
/// is returned as-is. Missing cells stay missing. Never fails.
pub fn coerce_string(frame: &Frame, column: &str) -> Frame {
    let Some(idx) = frame.column_index(column) else {
        debug!("coerce_string: column '{}' not present, nothing to do", column);
        return frame.clone();
    };

    let has_numbers = frame.rows().iter().any(|row| row[idx].is_number());
    if !has_numbers {
        return frame.clone();
    }

    let mut rows = frame.rows().to_vec();
    for row in &mut rows {
        row[idx] = match &row[idx] {
            Value::Missing => Value::Missing,
            value => Value::Text(value.display().trim().to_string()),
        };
    }

    Frame::from_parts(frame.columns().to_vec(), rows)
}

/// The lenient numeric policy shared by coercion and aggregation: numbers
/// pass through (NaN counts as unparseable), text is trimmed and parsed,
/// everything else is 0.
pub fn parse_numeric_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => *n,
        Value::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Missing => 0.0,
    };
    if parsed.is_nan() {
        0.0
    } else {
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::BufferNotifier;

    fn make_frame() -> Frame {
        Frame::new(
            vec![" ano_base ".to_string(), "total_pago".to_string()],
            vec![
                vec![Value::Number(2020.0), Value::text("100")],
                vec![Value::Number(2021.0), Value::text("200")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_trims_column_names() {
        let frame = make_frame();
        let normalized = normalize(&frame);
        assert_eq!(normalized.columns(), &["ano_base", "total_pago"]);
        assert_eq!(normalized.rows(), frame.rows());
    }

    #[test]
    fn test_normalize_empty_returns_empty() {
        let empty = Frame::new(vec!["a".to_string()], vec![]).unwrap();
        assert!(normalize(&empty).is_empty());
        assert!(normalize(&Frame::default()).is_empty());
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let frame = make_frame();
        let before = frame.clone();
        let _ = normalize(&frame);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_validate_all_present() {
        let notifier = BufferNotifier::new();
        let frame = normalize(&make_frame());
        let required = vec!["ano_base".to_string(), "total_pago".to_string()];
        assert!(validate(&frame, &required, &notifier));
        assert!(notifier.is_clean());
    }

    #[test]
    fn test_validate_missing_columns() {
        let notifier = BufferNotifier::new();
        let frame = normalize(&make_frame());
        let required = vec!["total_pago".to_string(), "juros_estimado".to_string()];
        assert!(!validate(&frame, &required, &notifier));

        let errors = notifier.errors();
        assert_eq!(errors.len(), 1);
        // Names exactly the absent column and enumerates what exists
        assert!(errors[0].contains("Missing columns: [\"juros_estimado\"]"));
        assert!(errors[0].contains("available columns"));
        assert!(errors[0].contains("ano_base"));
    }

    #[test]
    fn test_validate_empty_dataset() {
        let notifier = BufferNotifier::new();
        let empty = Frame::default();
        assert!(!validate(&empty, &["x".to_string()], &notifier));
        assert_eq!(notifier.warnings(), vec!["Dataset is empty".to_string()]);
        assert!(notifier.errors().is_empty());
    }

    #[test]
    fn test_coerce_numeric_mixed_column() {
        let frame = Frame::new(
            vec!["v".to_string()],
            vec![
                vec![Value::text("10")],
                vec![Value::text("abc")],
                vec![Value::Number(5.0)],
                vec![Value::Missing],
            ],
        )
        .unwrap();
        let coerced = coerce_numeric(&frame, "v");
        let values: Vec<f64> = coerced
            .rows()
            .iter()
            .map(|r| r[0].as_number().unwrap())
            .collect();
        assert_eq!(values, vec![10.0, 0.0, 5.0, 0.0]);
        // Input untouched
        assert_eq!(frame.rows()[1][0], Value::text("abc"));
    }

    #[test]
    fn test_coerce_numeric_unknown_column_is_noop() {
        let frame = make_frame();
        assert_eq!(coerce_numeric(&frame, "nope"), frame);
    }

    #[test]
    fn test_coerce_string_converts_mixed_column() {
        let frame = Frame::new(
            vec!["x".to_string()],
            vec![
                vec![Value::Number(2020.0)],
                vec![Value::text(" PIS ")],
                vec![Value::Missing],
            ],
        )
        .unwrap();
        let coerced = coerce_string(&frame, "x");
        assert_eq!(coerced.rows()[0][0], Value::text("2020"));
        assert_eq!(coerced.rows()[1][0], Value::text("PIS"));
        assert_eq!(coerced.rows()[2][0], Value::Missing);
    }

    #[test]
    fn test_coerce_string_textual_column_is_noop() {
        let frame = Frame::new(
            vec!["x".to_string()],
            vec![vec![Value::text(" PIS ")], vec![Value::Missing]],
        )
        .unwrap();
        assert_eq!(coerce_string(&frame, "x"), frame);
    }

    #[test]
    fn test_parse_numeric_or_zero() {
        assert_eq!(parse_numeric_or_zero(&Value::Number(7.5)), 7.5);
        assert_eq!(parse_numeric_or_zero(&Value::Number(f64::NAN)), 0.0);
        assert_eq!(parse_numeric_or_zero(&Value::text("100")), 100.0);
        assert_eq!(parse_numeric_or_zero(&Value::text(" 100 ")), 100.0);
        assert_eq!(parse_numeric_or_zero(&Value::text("R$ 100")), 0.0);
        assert_eq!(parse_numeric_or_zero(&Value::Missing), 0.0);
    }
}
