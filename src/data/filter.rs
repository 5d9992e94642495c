use log::info;

use super::model::Table;
use crate::error::NormalizeError;

// ---------------------------------------------------------------------------
// Row and column gates applied right after loading
// ---------------------------------------------------------------------------

/// Return indices of rows that have a value in every critical column.
///
/// A row passes when:
/// * `critical` is empty → passes (no constraint)
/// * every listed column holds a non-null value → passes
pub fn complete_indices(table: &Table, critical: &[String]) -> Result<Vec<usize>, NormalizeError> {
    let indices = critical
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| indices.iter().all(|&idx| !row[idx].is_null()))
        .map(|(i, _)| i)
        .collect())
}

/// Drop every row missing a critical value.  This is a data-quality gate,
/// not an error: only a critical column absent from the table fails.
pub fn drop_incomplete_rows(mut table: Table, critical: &[String]) -> Result<Table, NormalizeError> {
    let keep = complete_indices(&table, critical)?;
    let before = table.len();
    let mut keep = keep.into_iter().peekable();
    let mut i = 0;
    table.rows.retain(|_| {
        let kept = keep.next_if_eq(&i).is_some();
        i += 1;
        kept
    });
    if table.len() < before {
        info!(
            "Dropped {} row(s) missing one of {:?}",
            before - table.len(),
            critical
        );
    }
    Ok(table)
}

/// Non-null count of each listed column, in order.
pub fn non_null_counts(
    table: &Table,
    columns: &[String],
) -> Result<Vec<(String, usize)>, NormalizeError> {
    columns
        .iter()
        .map(|c| Ok((c.clone(), table.non_null_count(c)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn table() -> Table {
        let mut t = Table::with_columns("movies", &["id", "release_date", "budget"]);
        t.rows = vec![
            vec![Value::Integer(1), "1995-10-30".into(), Value::Integer(10)],
            vec![Value::Integer(2), Value::Null, Value::Integer(20)],
            vec![Value::Integer(3), "1995-12-15".into(), Value::Null],
            vec![Value::Integer(4), "1996-01-01".into(), "not_a_number".into()],
        ];
        t
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn drops_rows_missing_critical_values() {
        let t = drop_incomplete_rows(table(), &cols(&["release_date", "budget"])).unwrap();
        let ids: Vec<_> = t.column_values("id").unwrap();
        assert_eq!(ids, vec![&Value::Integer(1), &Value::Integer(4)]);
    }

    #[test]
    fn no_critical_columns_keeps_everything() {
        assert_eq!(complete_indices(&table(), &[]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn unknown_critical_column_is_fatal() {
        assert!(drop_incomplete_rows(table(), &cols(&["revenue"])).is_err());
    }

    #[test]
    fn counts_non_null_values() {
        let counts = non_null_counts(&table(), &cols(&["release_date", "budget"])).unwrap();
        assert_eq!(
            counts,
            vec![("release_date".to_string(), 3), ("budget".to_string(), 3)]
        );
    }
}
