use std::path::Path;

use anyhow::{Context, Result};
use log::{Level, debug, info, log_enabled};

use crate::config::PipelineConfig;
use crate::data::export::preview;
use crate::data::filter::{drop_incomplete_rows, non_null_counts};
use crate::data::loader::load_file;
use crate::data::model::Table;
use crate::error::NormalizeError;
use crate::extract::{Extraction, extract_nested, normalize_numeric, resolve_collections};

// ---------------------------------------------------------------------------
// NormalizedCatalog – the full output table set
// ---------------------------------------------------------------------------

/// Every table a run produces.  Built all at once, so a caller either gets
/// the complete set or an error.
#[derive(Debug, Clone)]
pub struct NormalizedCatalog {
    /// The cleaned source table, annotated with the collection name.
    pub movies: Table,
    pub collections: Table,
    /// One entity + junction pair per configured nested concept, in order.
    pub concepts: Vec<Extraction>,
}

impl NormalizedCatalog {
    /// All tables in export order: movies, collections, then each concept's
    /// entity table followed by its junction table.
    pub fn into_named_tables(self) -> Vec<Table> {
        let mut tables = vec![self.movies, self.collections];
        for concept in self.concepts {
            tables.push(concept.entities);
            tables.push(concept.junction);
        }
        tables
    }

    /// Look up a table by its export name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        std::iter::once(&self.movies)
            .chain(std::iter::once(&self.collections))
            .chain(self.concepts.iter().flat_map(|c| [&c.entities, &c.junction]))
            .find(|t| t.name == name)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Load `path` and run the whole pipeline over it.
    pub fn run_file(&self, path: &Path) -> Result<NormalizedCatalog> {
        let source = load_file(path)?;
        self.run(source)
            .with_context(|| format!("normalizing {}", path.display()))
    }

    /// Run every stage over an already loaded table.
    ///
    /// Any configured column missing from the table aborts the run.
    pub fn run(&self, source: Table) -> Result<NormalizedCatalog, NormalizeError> {
        let cfg = &self.config;

        info!("Initial preprocessing...");
        let mut movies = source;
        movies.name = cfg.movies_table.clone();
        movies.drop_columns(&cfg.columns_to_drop)?;
        let movies = drop_incomplete_rows(movies, &cfg.critical_columns)?;
        info!("Initial preprocessing complete. Shape: {:?}", movies.shape());

        info!("Processing collections...");
        let (mut collections, movies) = resolve_collections(movies, &cfg.collection.source)?;
        collections.name = cfg.collection.table_name.clone();
        info!("'{}' table created. Shape: {:?}", collections.name, collections.shape());

        let mut concepts = Vec::with_capacity(cfg.nested.len());
        for concept in &cfg.nested {
            info!("Processing {}...", concept.source.column);
            let mut extraction = extract_nested(&movies, &concept.source, &cfg.parent)?;
            if let Some(alias) = &concept.id_alias {
                if !extraction.entities.has_column(alias) {
                    extraction
                        .entities
                        .rename_column(&concept.source.id_key, alias)?;
                }
            }
            extraction.entities.name = concept.table_name.clone();
            extraction.junction.name = concept.junction_name.clone();
            info!(
                "'{}' table created. Shape: {:?}",
                extraction.entities.name,
                extraction.entities.shape()
            );
            info!(
                "'{}' table created. Shape: {:?}",
                extraction.junction.name,
                extraction.junction.shape()
            );
            concepts.push(extraction);
        }

        info!("Converting numeric columns...");
        let movies = normalize_numeric(movies, &cfg.numeric_columns, cfg.precision)?;

        for (column, count) in non_null_counts(&movies, &cfg.report_columns)? {
            info!("'{column}': {count} non-null rows");
        }
        if log_enabled!(Level::Debug) {
            match preview(&movies, 5) {
                Ok(grid) => debug!("Sample of preprocessed '{}':\n{grid}", movies.name),
                Err(err) => debug!("no preview of '{}': {err:#}", movies.name),
            }
        }

        Ok(NormalizedCatalog {
            movies,
            collections,
            concepts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    const HEADER: &[&str] = &[
        "id",
        "title",
        "original_title",
        "tagline",
        "video",
        "poster_path",
        "status",
        "release_date",
        "popularity",
        "revenue",
        "budget",
        "runtime",
        "overview",
        "belongs_to_collection",
        "genres",
        "production_companies",
        "production_countries",
        "spoken_languages",
    ];

    fn movie(id: i64, release: Value, budget: Value, genres: &str, collection: Value) -> Vec<Value> {
        vec![
            Value::Integer(id),
            Value::from(format!("Movie {id}")),
            Value::from(format!("Original {id}")),
            Value::Null,
            Value::from("False"),
            Value::from("/poster.jpg"),
            Value::from("Released"),
            release,
            Value::Float(1.5),
            Value::Integer(1000),
            budget,
            "90.0".into(),
            "An overview".into(),
            collection,
            Value::from(genres),
            "[{'name': 'Pixar', 'id': 3}]".into(),
            "[{'iso_3166_1': 'US', 'name': 'United States of America'}]".into(),
            "[{'iso_639_1': 'en', 'name': 'English'}]".into(),
        ]
    }

    fn source(rows: Vec<Vec<Value>>) -> Table {
        let mut table = Table::with_columns("movies_metadata", HEADER);
        table.rows = rows;
        table
    }

    #[test]
    fn produces_the_full_table_set() {
        let table = source(vec![
            movie(
                1,
                "1995-10-30".into(),
                "1234.567".into(),
                "[{'id': 35, 'name': 'Comedy'}]",
                "{'id': 10, 'name': 'Franchise A', 'poster_path': '/x.jpg'}".into(),
            ),
            movie(2, Value::Null, Value::Integer(5), "[]", Value::Null),
            movie(
                3,
                "2001-01-01".into(),
                "not_a_number".into(),
                "[{'id': 35, 'name': 'Comedy'}, {'id': 18, 'name': 'Drama'}]",
                "nan".into(),
            ),
        ]);

        let catalog = Pipeline::new(PipelineConfig::default()).run(table).unwrap();

        let movies = &catalog.movies;
        assert_eq!(movies.name, "movies");
        assert_eq!(movies.len(), 2, "row without release_date is dropped");
        assert!(!movies.has_column("tagline"));
        assert_eq!(movies.cell(0, "budget"), Some(&Value::Float(1234.57)));
        assert_eq!(movies.cell(1, "budget"), Some(&Value::Null));
        assert_eq!(movies.cell(0, "runtime"), Some(&Value::Float(90.0)));
        assert_eq!(movies.cell(0, "collection_name"), Some(&Value::from("Franchise A")));
        assert_eq!(movies.cell(1, "collection_name"), Some(&Value::Null));

        let genres = catalog.table("genres").unwrap();
        assert_eq!(genres.len(), 2);
        assert_eq!(catalog.table("genres_movies").unwrap().len(), 3);

        let countries = catalog.table("countries").unwrap();
        assert_eq!(countries.columns, vec!["id", "name"]);
        assert_eq!(
            catalog.table("countries_movies").unwrap().columns,
            vec!["movie_id", "movie_title", "iso_3166_1_id", "name_name"]
        );

        let names: Vec<String> = catalog
            .into_named_tables()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, PipelineConfig::default().table_names());
    }

    #[test]
    fn empty_source_still_yields_ten_tables() {
        let catalog = Pipeline::new(PipelineConfig::default())
            .run(source(Vec::new()))
            .unwrap();
        let tables = catalog.into_named_tables();
        assert_eq!(tables.len(), 10);
        assert!(tables.iter().all(|t| !t.columns.is_empty()));
    }

    #[test]
    fn missing_nested_column_aborts_the_run() {
        let mut config = PipelineConfig::default();
        config.nested[0].source.column = "keywords".into();
        let err = Pipeline::new(config).run(source(Vec::new())).unwrap_err();
        assert_eq!(err, NormalizeError::missing_column("movies", "keywords"));
    }
}
