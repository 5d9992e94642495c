use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Table, Value};
use crate::extract::literal::Literal;

/// Cell spellings read as missing, matching the Pandas `read_csv` defaults.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a source table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one movie per record (the usual TMDB dump)
/// * `.json`    – `[{ "id": 862, "title": "...", "genres": [...] }, ...]`
/// * `.parquet` – flat columns; nested columns stored as literal text
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("source");

    let table = match ext.as_str() {
        "csv" => load_csv(path, name),
        "json" => load_json(path, name),
        "parquet" | "pq" => load_parquet(path, name),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other row one movie.
/// Nested columns hold literal text such as `"[{'id': 18, 'name': 'Drama'}]"`.
/// Ragged rows are padded with missing values or truncated.
fn load_csv(path: &Path, name: &str) -> Result<Table> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    read_csv(reader, name)
}

/// Read CSV from any reader; split out so tests need no files.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>, name: &str) -> Result<Table> {
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::with_columns(name, &columns);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != columns.len() {
            warn!(
                "CSV row {row_no}: {} fields, expected {}",
                record.len(),
                columns.len()
            );
        }
        let mut row: Vec<Value> = record.iter().take(columns.len()).map(guess_value).collect();
        row.resize(columns.len(), Value::Null);
        table.rows.push(row);
    }
    Ok(table)
}

/// Type a raw text cell.  Integers are only recognised when they render back
/// to the same text, so codes like `"007"` stay text.
pub fn guess_value(s: &str) -> Value {
    if NA_VALUES.contains(&s) {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        if i.to_string() == s {
            return Value::Integer(i);
        }
        // "007", "+5", "-0": a number, but not one we can write back unchanged
        return Value::Text(s.to_string());
    }
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "id": 862,
///     "title": "Toy Story",
///     "genres": [{"id": 16, "name": "Animation"}],
///     "budget": 30000000
///   },
///   ...
/// ]
/// ```
///
/// Arrays and objects are stored as literal text so they go through the same
/// nested-column parser as CSV cells.
fn load_json(path: &Path, name: &str) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text, name)
}

pub fn parse_json(text: &str, name: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::with_columns(name, &columns);
    for rec in records {
        let row = columns
            .iter()
            .map(|col| rec.get(col).map(json_to_value).unwrap_or(Value::Null))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        container => Value::Text(json_to_literal(container).to_string()),
    }
}

fn json_to_literal(val: &JsonValue) -> Literal {
    match val {
        JsonValue::Null => Literal::None,
        JsonValue::Bool(b) => Literal::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Literal::Int(i),
            None => Literal::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Literal::Str(s.clone()),
        JsonValue::Array(items) => Literal::List(items.iter().map(json_to_literal).collect()),
        JsonValue::Object(map) => Literal::Dict(
            map.iter()
                .map(|(k, v)| (Literal::Str(k.clone()), json_to_literal(v)))
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written from the same table (e.g. `df.to_parquet()`).
/// Strings, ints, floats and bools map to their [`Value`] counterparts.
fn load_parquet(path: &Path, name: &str) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::with_columns(name, &columns);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, col_name)| {
                    extract_value(col, row)
                        .with_context(|| format!("Row {row}: failed to read '{col_name}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            table.rows.push(cells);
        }
    }
    Ok(table)
}

/// Extract a single value from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Value::Text(s.value(row).to_string())
        }
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            Value::Bool(arr.value(row))
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_cell_types() {
        assert_eq!(guess_value(""), Value::Null);
        assert_eq!(guess_value("NaN"), Value::Null);
        assert_eq!(guess_value("862"), Value::Integer(862));
        assert_eq!(guess_value("007"), Value::from("007"));
        assert_eq!(guess_value("-0"), Value::from("-0"));
        assert_eq!(guess_value("+5"), Value::from("+5"));
        assert_eq!(guess_value("-3"), Value::Integer(-3));
        assert_eq!(guess_value("0.50"), Value::Float(0.5));
        assert_eq!(guess_value("21.946943"), Value::Float(21.946943));
        assert_eq!(guess_value("Infinity"), Value::from("Infinity"));
        assert_eq!(guess_value("true"), Value::Bool(true));
        assert_eq!(guess_value("False"), Value::from("False"));
        assert_eq!(guess_value("1995-10-30"), Value::from("1995-10-30"));
    }

    #[test]
    fn reads_quoted_nested_cells_and_pads_short_rows() {
        let data = "id,title,genres\n\
                    862,Toy Story,\"[{'id': 16, 'name': 'Animation'}]\"\n\
                    8844,Jumanji\n";
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        let table = read_csv(reader, "movies").unwrap();
        assert_eq!(table.columns, vec!["id", "title", "genres"]);
        assert_eq!(
            table.cell(0, "genres"),
            Some(&Value::from("[{'id': 16, 'name': 'Animation'}]"))
        );
        assert_eq!(table.cell(1, "genres"), Some(&Value::Null));
    }

    #[test]
    fn json_containers_become_literal_text() {
        let table = parse_json(
            r#"[{"id": 1, "title": "X", "genres": [{"id": 35, "name": "Comedy"}], "adult": false},
                {"id": 2, "title": "Y", "belongs_to_collection": null}]"#,
            "movies",
        )
        .unwrap();
        assert_eq!(
            table.cell(0, "genres"),
            Some(&Value::from("[{'id': 35, 'name': 'Comedy'}]"))
        );
        assert_eq!(table.cell(1, "genres"), Some(&Value::Null));
        assert_eq!(table.cell(0, "belongs_to_collection"), Some(&Value::Null));
        assert_eq!(table.cell(0, "adult"), Some(&Value::Bool(false)));
    }

    #[test]
    fn rejects_non_array_json() {
        assert!(parse_json(r#"{"id": 1}"#, "movies").is_err());
    }
}
