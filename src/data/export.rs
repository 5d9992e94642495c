use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use log::info;
use parquet::arrow::ArrowWriter;

use super::model::{Table, Value};

/// On-disk format of exported tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// Write every table to `<dir>/<table.name>.<ext>`, creating `dir` if needed.
/// Returns the written paths in table order.
pub fn export_tables(tables: &[Table], dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        info!("Created directory: {}", dir.display());
    }

    info!("Exporting {} tables to '{}'", tables.len(), dir.display());
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.{}", table.name, format.extension()));
        let result = match format {
            ExportFormat::Csv => write_csv(table, &path),
            ExportFormat::Parquet => write_parquet(table, &path),
        };
        result.with_context(|| format!("writing {}", path.display()))?;
        info!(
            "Exported '{}.{}' ({} rows, {} columns)",
            table.name,
            format.extension(),
            table.len(),
            table.columns.len()
        );
        written.push(path);
    }
    Ok(written)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row plus one record per row; missing values are empty fields.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    write_csv_to(table, &mut writer)?;
    writer.flush().context("flushing CSV")?;
    Ok(())
}

pub fn write_csv_to<W: std::io::Write>(table: &Table, writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record(&table.columns).context("writing CSV header")?;
    for (row_no, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Arrow type chosen for one column from the values it holds.
fn infer_type(table: &Table, idx: usize) -> DataType {
    let mut values = table.rows.iter().map(|r| &r[idx]).filter(|v| !v.is_null()).peekable();
    if values.peek().is_none() {
        return DataType::Utf8;
    }
    let (mut ints, mut floats, mut bools, mut other) = (0, 0, 0, 0);
    for v in values {
        match v {
            Value::Integer(_) => ints += 1,
            Value::Float(_) => floats += 1,
            Value::Bool(_) => bools += 1,
            _ => other += 1,
        }
    }
    match (ints, floats, bools, other) {
        (_, 0, 0, 0) => DataType::Int64,
        (_, _, 0, 0) => DataType::Float64,
        (0, 0, _, 0) => DataType::Boolean,
        _ => DataType::Utf8,
    }
}

fn build_array(table: &Table, idx: usize, data_type: &DataType) -> ArrayRef {
    let cells = table.rows.iter().map(|r| &r[idx]);
    match data_type {
        DataType::Int64 => Arc::new(Int64Array::from(
            cells
                .map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            cells.map(Value::as_f64).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            cells
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

/// Convert a table to one Arrow batch; every column nullable, typed by
/// [`infer_type`].
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let types: Vec<DataType> = (0..table.columns.len())
        .map(|idx| infer_type(table, idx))
        .collect();
    let schema = Arc::new(Schema::new(
        table
            .columns
            .iter()
            .zip(&types)
            .map(|(name, ty)| Field::new(name, ty.clone(), true))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = types
        .iter()
        .enumerate()
        .map(|(idx, ty)| build_array(table, idx, ty))
        .collect();

    RecordBatch::try_new(schema, arrays).context("building record batch")
}

pub fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// The first `n` rows rendered as a text grid, for log output.
pub fn preview(table: &Table, n: usize) -> Result<String> {
    let head = Table {
        name: table.name.clone(),
        columns: table.columns.clone(),
        rows: table.rows.iter().take(n).cloned().collect(),
    };
    let batch = to_record_batch(&head)?;
    Ok(pretty_format_batches(&[batch])
        .context("formatting preview")?
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::with_columns("genres_movies", &["movie_id", "movie_title", "score"]);
        t.rows = vec![
            vec![Value::Integer(1), "Toy Story".into(), Value::Float(7.7)],
            vec![Value::Integer(2), "Heat, the movie".into(), Value::Integer(8)],
            vec![Value::Integer(3), Value::Null, Value::Null],
        ];
        t
    }

    #[test]
    fn csv_has_header_and_no_index_column() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_csv_to(&sample(), &mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "movie_id,movie_title,score\n1,Toy Story,7.7\n2,\"Heat, the movie\",8\n3,,\n"
        );
    }

    #[test]
    fn infers_parquet_column_types() {
        let t = sample();
        assert_eq!(infer_type(&t, 0), DataType::Int64);
        assert_eq!(infer_type(&t, 1), DataType::Utf8);
        assert_eq!(infer_type(&t, 2), DataType::Float64);
        assert_eq!(infer_type(&Table::with_columns("e", &["id"]), 0), DataType::Utf8);
    }

    #[test]
    fn preview_shows_only_the_head() {
        let text = preview(&sample(), 2).unwrap();
        assert!(text.contains("Toy Story"));
        assert!(text.contains("Heat, the movie"));
        assert!(!text.contains("| 3 "));
    }
}
