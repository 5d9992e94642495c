use log::debug;

use crate::data::model::{Table, Value};
use crate::error::NormalizeError;

/// Coerce the named columns to numbers rounded to `precision` decimals.
///
/// Values that are not numbers become `Null`; the row is kept.  Applying
/// this twice gives the same table as applying it once.
pub fn normalize_numeric<S: AsRef<str>>(
    mut table: Table,
    columns: &[S],
    precision: u32,
) -> Result<Table, NormalizeError> {
    for column in columns {
        let column = column.as_ref();
        let idx = table.require_column(column)?;
        let mut coerced_to_null = 0usize;
        for row in &mut table.rows {
            let value = coerce_numeric(&row[idx], precision);
            if value.is_null() && !row[idx].is_null() {
                coerced_to_null += 1;
            }
            row[idx] = value;
        }
        if coerced_to_null > 0 {
            debug!("'{column}': {coerced_to_null} non-numeric value(s) set to missing");
        }
    }
    Ok(table)
}

/// Numeric coercion of a single cell.
///
/// * integers stay integers
/// * floats are rounded half-to-even
/// * text is parsed; integers become `Integer`, other numbers a rounded
///   `Float`, anything else `Null`
/// * infinities (`"inf"`, `"1e400"`) are numbers and stay infinite; NaN is
///   missing
/// * booleans become 0 / 1
pub fn coerce_numeric(value: &Value, precision: u32) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Integer(i) => Value::Integer(*i),
        Value::Bool(b) => Value::Integer(i64::from(*b)),
        Value::Float(f) => rounded(*f, precision),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Value::Integer(i);
            }
            match s.parse::<f64>() {
                Ok(f) => rounded(f, precision),
                Err(_) => Value::Null,
            }
        }
    }
}

fn rounded(v: f64, precision: u32) -> Value {
    if v.is_nan() {
        return Value::Null;
    }
    let factor = 10f64.powi(precision as i32);
    // past 2^53 there are no fractional digits left to round away
    if (v * factor).abs() >= 9_007_199_254_740_992.0 {
        return Value::Float(v);
    }
    Value::Float((v * factor).round_ties_even() / factor)
}
