//! Normalise a denormalised movie catalog into entity and junction tables.
//!
//! The source table carries nested columns whose cells are Python-literal
//! lists of records (`"[{'id': 18, 'name': 'Drama'}]"`).  Each nested column
//! becomes a deduplicated entity table plus a movie ↔ entity junction table.

pub mod config;
pub mod data;
pub mod error;
pub mod extract;
pub mod pipeline;

pub use config::PipelineConfig;
pub use data::model::{Record, Table, Value};
pub use error::{ConfigError, NormalizeError, ParseError};
pub use pipeline::{NormalizedCatalog, Pipeline};
