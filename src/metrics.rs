use crate::config::Schema;
use crate::frame::Frame;
use crate::prepare::parse_numeric_or_zero;
use tracing::debug;

/// A named scalar for one dashboard card. Raw number; formatting is the
/// presentation layer's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub label: String,
    pub value: f64,
}

/// Lenient column sum: every value goes through the numeric-or-zero
/// policy, so unparseable cells contribute nothing. Empty datasets and
/// absent columns sum to 0.
pub fn sum_column(frame: &Frame, column: &str) -> f64 {
    let Some(values) = frame.column_values(column) else {
        debug!("sum_column: column '{}' not present, summing to 0", column);
        return 0.0;
    };
    values.into_iter().map(parse_numeric_or_zero).sum()
}

/// The four recovery cards over the configured schema columns.
pub fn summarize(frame: &Frame, schema: &Schema) -> Vec<Aggregate> {
    [
        ("Total Pago", &schema.paid),
        ("Valor Recuperável Estimado", &schema.recoverable),
        ("Valor de Juros Estimado", &schema.interest),
        ("Valor Líquido a receber", &schema.net),
    ]
    .into_iter()
    .map(|(label, column)| Aggregate {
        label: label.to_string(),
        value: sum_column(frame, column),
    })
    .collect()
}
