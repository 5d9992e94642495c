use std::collections::HashSet;

use log::debug;
use serde::Deserialize;

use super::ParentColumns;
use super::literal::parse_cell_or_empty;
use crate::data::model::{Record, Table, Value};
use crate::error::NormalizeError;

/// Canonical display column of every entity table.
pub const NAME_COLUMN: &str = "name";

// ---------------------------------------------------------------------------
// NestedColumn – which column to explode and how its records are keyed
// ---------------------------------------------------------------------------

/// A source column holding a list of tagged records per row.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedColumn {
    pub column: String,
    /// Field that identifies an entity (`id`, `iso_3166_1`, ...).
    pub id_key: String,
    /// Field holding the entity's display name.
    pub name_key: String,
    /// Fields stripped from every record before it is kept.
    #[serde(default)]
    pub drop_keys: Vec<String>,
}

impl NestedColumn {
    pub fn new(column: &str, id_key: &str, name_key: &str) -> Self {
        Self {
            column: column.into(),
            id_key: id_key.into(),
            name_key: name_key.into(),
            drop_keys: Vec::new(),
        }
    }

    /// Junction column carrying the entity identifier.
    pub fn junction_id_column(&self) -> String {
        format!("{}_id", self.id_key)
    }

    /// Junction column carrying the entity display name.
    pub fn junction_name_column(&self) -> String {
        format!("{}_name", self.name_key)
    }
}

/// The two tables produced from one nested column.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// One row per distinct identifier, first occurrence wins.
    pub entities: Table,
    /// One row per (movie, entity) reference.
    pub junction: Table,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Explode `target.column` of `table` into an entity table and a junction table.
///
/// Malformed cells contribute nothing.  The only error is a column that the
/// table does not have.
pub fn extract_nested(
    table: &Table,
    target: &NestedColumn,
    parent: &ParentColumns,
) -> Result<Extraction, NormalizeError> {
    let cells = table.column_values(&target.column)?;
    let movie_ids = table.column_values(&parent.id)?;
    let titles = table.column_values(&parent.title)?;

    let mut non_records = 0usize;
    let (records, links) = cells.iter().zip(movie_ids.iter().zip(&titles)).fold(
        (Vec::new(), Vec::new()),
        |(mut records, mut links): (Vec<Record>, Vec<Vec<Value>>), (cell, (movie_id, title))| {
            for element in parse_cell_or_empty(cell) {
                let Some(record) = element.into_record() else {
                    non_records += 1;
                    continue;
                };
                let record = record.without(&target.drop_keys);
                if let (Some(id), Some(name)) =
                    (record.get(&target.id_key), record.get(&target.name_key))
                {
                    links.push(vec![
                        (*movie_id).clone(),
                        (*title).clone(),
                        id.clone(),
                        name.clone(),
                    ]);
                }
                records.push(record);
            }
            (records, links)
        },
    );

    if non_records > 0 {
        debug!(
            "'{}': skipped {non_records} element(s) that are not records",
            target.column
        );
    }

    let entities = entity_table(&target.column, records, &target.id_key, &target.name_key)?;
    let junction = Table {
        name: format!("{}_movies", target.column),
        columns: vec![
            "movie_id".to_string(),
            "movie_title".to_string(),
            target.junction_id_column(),
            target.junction_name_column(),
        ],
        rows: links,
    };

    debug!(
        "'{}': {} entities, {} links",
        target.column,
        entities.len(),
        junction.len()
    );
    Ok(Extraction { entities, junction })
}

/// Keep the first record seen for each identifier.  Records without the
/// identifier share one `Null` key, so only the first of them survives.
/// Identifiers compare by [`Value::dedup_key`], so `35` and `35.0` collide.
pub fn dedup_by_key(records: Vec<Record>, id_key: &str) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let key = record.get(id_key).map_or(Value::Null, Value::dedup_key);
            seen.insert(key)
        })
        .collect()
}

/// Deduplicate records into a table whose display column is called `name`.
/// With no records the header is `[id_key, name]`.
pub(crate) fn entity_table(
    table_name: &str,
    records: Vec<Record>,
    id_key: &str,
    name_key: &str,
) -> Result<Table, NormalizeError> {
    let unique = dedup_by_key(records, id_key);
    let mut entities = if unique.is_empty() {
        Table::with_columns(table_name, &[id_key, name_key])
    } else {
        Table::from_records(table_name, &unique)
    };
    if !entities.has_column(NAME_COLUMN) {
        entities.rename_column(name_key, NAME_COLUMN)?;
    }
    Ok(entities)
}
