use log::debug;
use serde::Deserialize;

use super::literal::parse_cell_or_empty;
use super::nested::entity_table;
use crate::data::model::{Record, Table, Value};
use crate::error::NormalizeError;

// ---------------------------------------------------------------------------
// CollectionColumn – a nested column with at most one record per row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionColumn {
    pub column: String,
    pub id_key: String,
    pub name_key: String,
    /// Image path fields that carry no analytical value.
    pub drop_keys: Vec<String>,
    /// Column added to the source table with the resolved display name.
    pub annotation: String,
}

impl Default for CollectionColumn {
    fn default() -> Self {
        Self {
            column: "belongs_to_collection".into(),
            id_key: "id".into(),
            name_key: "name".into(),
            drop_keys: vec!["poster_path".into(), "backdrop_path".into()],
            annotation: "collection_name".into(),
        }
    }
}

/// Resolve each row's optional collection.
///
/// Returns the deduplicated collection table and the source table with
/// `target.annotation` set to the collection name, or `Null` when the row has
/// no (parseable) collection.
pub fn resolve_collections(
    mut table: Table,
    target: &CollectionColumn,
) -> Result<(Table, Table), NormalizeError> {
    let resolved: Vec<Option<Record>> = table
        .column_values(&target.column)?
        .into_iter()
        .map(first_record)
        .collect();

    let names = resolved
        .iter()
        .map(|record| {
            record
                .as_ref()
                .and_then(|r| r.get(&target.name_key))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();
    table.set_column(&target.annotation, names);

    let records: Vec<Record> = resolved
        .into_iter()
        .flatten()
        .map(|record| record.without(&target.drop_keys))
        .collect();
    debug!(
        "'{}': {} of {} rows belong to a collection",
        target.column,
        records.len(),
        table.len()
    );

    let collections = entity_table(&target.column, records, &target.id_key, &target.name_key)?;
    Ok((collections, table))
}

/// The first element of a cell, if it is a non-empty record.
fn first_record(cell: &Value) -> Option<Record> {
    parse_cell_or_empty(cell)
        .into_iter()
        .next()?
        .into_record()
        .filter(|record| !record.is_empty())
}
