/// Normalisation layer: nested cells in, entity and junction tables out.
///
/// Architecture:
/// ```text
///   "[{'id': 35, 'name': 'Comedy'}]"
///        │
///        ▼
///   ┌──────────┐
///   │ literal   │  cell text → Vec<Literal>  (malformed → empty)
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌────────────┐
///   │ nested    │          │ collection │  at most one record per row
///   └──────────┘          └────────────┘
///   entity table +         entity table +
///   junction table         `collection_name` annotation
///
///   ┌──────────┐
///   │ numeric   │  scalar columns → rounded numbers
///   └──────────┘
/// ```

pub mod collection;
pub mod literal;
pub mod nested;
pub mod numeric;

use serde::Deserialize;

pub use collection::{CollectionColumn, resolve_collections};
pub use nested::{Extraction, NestedColumn, extract_nested};
pub use numeric::{coerce_numeric, normalize_numeric};

/// Columns of the source table that every junction row copies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParentColumns {
    pub id: String,
    pub title: String,
}

impl Default for ParentColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            title: "title".into(),
        }
    }
}
