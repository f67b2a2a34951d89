//! Loose value coercions shared by the predicate evaluator and transforms.
//! Rows come back from the query service as untyped JSON, so both string
//! and numeric views of a cell are derived here.

use crossfilter_shared::Row;
use serde_json::Value;
use std::borrow::Cow;

/// String view of a cell. Missing and null cells read as the empty string.
pub fn stringify(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(b)) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Some(Value::Number(n)) => Cow::Owned(format_number(n)),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Largest integer an f64 holds exactly (2^53 - 1)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Integral floats print without a fraction, so a `2020.0` cell reads as
/// `"2020"` the same way an integer cell does
fn format_number(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(value) = n.as_f64() {
            if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
                return format!("{}", value as i64);
            }
        }
    }
    n.to_string()
}

/// Numeric view of a cell. Numbers pass through, strings are parsed after
/// trimming; everything else (and NaN/inf) is not a number.
pub fn as_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parse a filter operand or cell text as a finite number
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// All parseable values of `column`, in row order
pub fn numeric_column(column: &str, rows: &[Row]) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| as_number(row.get(column)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(None), "");
        assert_eq!(stringify(Some(&Value::Null)), "");
        assert_eq!(stringify(Some(&json!("Delhi"))), "Delhi");
        assert_eq!(stringify(Some(&json!(42))), "42");
        assert_eq!(stringify(Some(&json!(2.5))), "2.5");
        assert_eq!(stringify(Some(&json!(2020.0))), "2020");
        assert_eq!(stringify(Some(&json!(-3.0))), "-3");
        assert_eq!(stringify(Some(&json!(1e300))), "1e300");
        assert_eq!(stringify(Some(&json!(true))), "true");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(Some(&json!(3))), Some(3.0));
        assert_eq!(as_number(Some(&json!(" 4.5 "))), Some(4.5));
        assert_eq!(as_number(Some(&json!("abc"))), None);
        assert_eq!(as_number(Some(&json!(""))), None);
        assert_eq!(as_number(Some(&json!("NaN"))), None);
        assert_eq!(as_number(Some(&json!(null))), None);
        assert_eq!(as_number(None), None);
    }

    #[test]
    fn test_numeric_column_drops_unparseable() {
        let rows: Vec<Row> = vec![
            json!({"v": 1}),
            json!({"v": "2"}),
            json!({"v": "n/a"}),
            json!({"other": 9}),
        ]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();

        assert_eq!(numeric_column("v", &rows), vec![1.0, 2.0]);
    }
}
