use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::extract::{CollectionColumn, NestedColumn, ParentColumns};

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Everything the pipeline needs to know about the source table.
///
/// `Default` reproduces the TMDB `movies_metadata.csv` run; a TOML file only
/// has to list the fields it wants to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Export name of the cleaned source table.
    pub movies_table: String,
    /// Identifier and title columns of the source table.
    pub parent: ParentColumns,
    /// Columns removed right after loading.
    pub columns_to_drop: Vec<String>,
    /// A row missing any of these is dropped.
    pub critical_columns: Vec<String>,
    pub collection: CollectionConfig,
    pub nested: Vec<NestedConceptConfig>,
    /// Scalar columns coerced to numbers.
    pub numeric_columns: Vec<String>,
    /// Decimal places kept by numeric coercion.
    pub precision: u32,
    /// Columns whose non-null counts are logged after normalisation.
    pub report_columns: Vec<String>,
}

/// The at-most-one-per-row franchise column.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub table_name: String,
    #[serde(flatten)]
    pub source: CollectionColumn,
}

/// One list-valued nested column and the two tables it becomes.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedConceptConfig {
    pub table_name: String,
    pub junction_name: String,
    /// Rename the entity identifier column to this after extraction.
    #[serde(default)]
    pub id_alias: Option<String>,
    #[serde(flatten)]
    pub source: NestedColumn,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            movies_table: "movies".into(),
            parent: ParentColumns::default(),
            columns_to_drop: strings(&["original_title", "tagline", "video", "poster_path", "status"]),
            critical_columns: strings(&["release_date", "popularity", "revenue", "budget"]),
            collection: CollectionConfig::default(),
            nested: vec![
                NestedConceptConfig::new("genres", "genres", "genres_movies", "id", "name"),
                NestedConceptConfig::new(
                    "production_companies",
                    "production_companies",
                    "production_companies_movies",
                    "id",
                    "name",
                ),
                NestedConceptConfig::new(
                    "production_countries",
                    "countries",
                    "countries_movies",
                    "iso_3166_1",
                    "name",
                )
                .with_id_alias("id"),
                NestedConceptConfig::new(
                    "spoken_languages",
                    "spoken_languages",
                    "spoken_languages_movies",
                    "iso_639_1",
                    "name",
                )
                .with_id_alias("id"),
            ],
            numeric_columns: strings(&["budget", "revenue", "runtime"]),
            precision: 2,
            report_columns: strings(&["budget", "revenue", "runtime", "overview"]),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            table_name: "collections".into(),
            source: CollectionColumn::default(),
        }
    }
}

impl NestedConceptConfig {
    pub fn new(
        column: &str,
        table_name: &str,
        junction_name: &str,
        id_key: &str,
        name_key: &str,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            junction_name: junction_name.into(),
            id_alias: None,
            source: NestedColumn::new(column, id_key, name_key),
        }
    }

    pub fn with_id_alias(mut self, alias: &str) -> Self {
        self.id_alias = Some(alias.into());
        self
    }
}

impl PipelineConfig {
    /// Load a TOML config file.  Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could never produce a consistent table set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision > 12 {
            return Err(ConfigError::Precision(self.precision));
        }
        if let Some(idx) = self.nested.iter().position(|n| n.source.column.is_empty()) {
            return Err(ConfigError::EmptyColumn(idx));
        }
        let mut seen = BTreeSet::new();
        for name in self.table_names() {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateTable(name.to_string()));
            }
        }
        Ok(())
    }

    /// Output table names in export order.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names = vec![self.movies_table.as_str(), self.collection.table_name.as_str()];
        for concept in &self.nested {
            names.push(&concept.table_name);
            names.push(&concept.junction_name);
        }
        names
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
