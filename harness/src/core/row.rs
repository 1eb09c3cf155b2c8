//! Row shape validation and encoding.
//!
//! The shape check is the correctness boundary between untyped question
//! logic and the declared output kind. It runs on every row.

use serde_json::Value;

use crate::core::error::EmissionShapeError;
use crate::core::types::OutputKind;

/// Validate `row` against `kind` and encode it as output text (no trailing newline).
///
/// - `Text`: strings verbatim, numbers in JSON form.
/// - `Csv`: array elements joined by `,`.
/// - `Json`: object pretty-printed with 2-space indentation.
pub fn encode_row(kind: OutputKind, row: &Value) -> Result<String, EmissionShapeError> {
    match (kind, row) {
        (OutputKind::Text, Value::String(text)) => Ok(text.clone()),
        (OutputKind::Text, Value::Number(number)) => Ok(number.to_string()),
        (OutputKind::Csv, Value::Array(cells)) => {
            Ok(cells.iter().map(csv_cell).collect::<Vec<_>>().join(","))
        }
        (OutputKind::Json, Value::Object(_)) => {
            serde_json::to_string_pretty(row).map_err(|_| EmissionShapeError::for_kind(kind))
        }
        _ => Err(EmissionShapeError::for_kind(kind)),
    }
}

/// Cells are written raw: no quoting, `null` as empty.
fn csv_cell(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => cell.to_string(),
    }
}
