use std::fmt;

use crate::error::NormalizeError;

// ---------------------------------------------------------------------------
// Value – a single cell or record field
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the handful of Pandas dtypes the
/// catalog uses.  Entity dedup keys on `Value`, so it must be `Eq + Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// Floats hash by bits; entity ids go through `Value::dedup_key` first.
impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

/// Renders the text written into an exported cell.  `Null` is empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Identity used when deduplicating entities: a whole-number `Float` in
    /// `i64` range is the same key as the matching `Integer`, since both
    /// export as the same text.
    pub fn dedup_key(&self) -> Value {
        match *self {
            Value::Float(f)
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
            {
                Value::Integer(f as i64)
            }
            ref other => other.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one tagged record pulled out of a nested cell
// ---------------------------------------------------------------------------

/// An insertion-ordered field map.  Field order is kept so that entity tables
/// get their columns in the order the source first spelled them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert a field.  An existing key is overwritten in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Drop every field named in `keys`.
    pub fn without(mut self, keys: &[String]) -> Self {
        self.fields.retain(|(k, _)| !keys.contains(k));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

// ---------------------------------------------------------------------------
// Table – a named, column-ordered frame
// ---------------------------------------------------------------------------

/// A rectangular table: ordered header plus rows aligned with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name used in error messages and as the export file stem.
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// An empty table with a fixed header.
    pub fn with_columns<S: AsRef<str>>(name: impl Into<String>, columns: &[S]) -> Self {
        Table {
            name: name.into(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from records.  The header is the union of all record
    /// keys in first-seen order; missing fields become `Null`.
    pub fn from_records(name: impl Into<String>, records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Table {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`, as Pandas reports it.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Like [`Table::column_index`], but a missing column is a contract violation.
    pub fn require_column(&self, column: &str) -> Result<usize, NormalizeError> {
        self.column_index(column)
            .ok_or_else(|| NormalizeError::missing_column(&self.name, column))
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, NormalizeError> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Look up a single cell.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Set (or append) a column from one value per row.
    ///
    /// Panics if `values` does not have one entry per row; callers build it
    /// by mapping over `self.rows`.
    pub fn set_column(&mut self, column: &str, values: Vec<Value>) {
        assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        match self.column_index(column) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(column.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Remove the named columns.  Every name must exist.
    pub fn drop_columns<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<(), NormalizeError> {
        let mut indices = columns
            .iter()
            .map(|c| self.require_column(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        indices.sort_unstable();
        indices.dedup();
        for idx in indices.into_iter().rev() {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        Ok(())
    }

    /// Rename `from` to `to` if `from` exists.  Returns whether a rename happened.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<bool, NormalizeError> {
        let Some(idx) = self.column_index(from) else {
            return Ok(false);
        };
        if from != to && self.has_column(to) {
            return Err(NormalizeError::DuplicateColumn {
                table: self.name.clone(),
                column: to.to_string(),
            });
        }
        self.columns[idx] = to.to_string();
        Ok(true)
    }

    /// Count of non-null values in a column.
    pub fn non_null_count(&self, column: &str) -> Result<usize, NormalizeError> {
        Ok(self
            .column_values(column)?
            .into_iter()
            .filter(|v| !v.is_null())
            .count())
    }
}
