use std::collections::HashSet;
use std::fs;
use std::path::Path;

use catalog_normalizer::data::export::{ExportFormat, export_tables};
use catalog_normalizer::{Pipeline, PipelineConfig, Value};
use tempfile::TempDir;

const SOURCE: &str = r#"adult,belongs_to_collection,budget,genres,id,original_title,overview,popularity,poster_path,production_companies,production_countries,release_date,revenue,runtime,spoken_languages,status,tagline,title,video
False,"{'id': 10194, 'name': 'Toy Story Collection', 'poster_path': '/7G9915LfUQ2lVfwMEEhDsn3kT4B.jpg', 'backdrop_path': '/9FBwqcd9IRruEDUrTdcaafOMKUq.jpg'}",30000000,"[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}, {'id': 10751, 'name': 'Family'}]",862,Toy Story,"Led by Woody, Andy's toys live happily.",21.946943,/rhIRbceoE9lR4veEXuwCC2wARtG.jpg,"[{'name': 'Pixar Animation Studios', 'id': 3}]","[{'iso_3166_1': 'US', 'name': 'United States of America'}]",1995-10-30,373554033,81.0,"[{'iso_639_1': 'en', 'name': 'English'}]",Released,,Toy Story,False
False,,65000000,"[{'id': 12, 'name': 'Adventure'}, {'id': 14, 'name': 'Fantasy'}, {'id': 10751, 'name': 'Family'}]",8844,Jumanji,When siblings Judy and Peter discover an enchanted board game.,17.015539,/vzmL6fP7aPKNKPRTFnZmiUfciyV.jpg,"[{'name': 'TriStar Pictures', 'id': 559}, {'name': 'Teitler Film', 'id': 2550}]","[{'iso_3166_1': 'US', 'name': 'United States of America'}]",1995-12-15,262797249,104.0,"[{'iso_639_1': 'en', 'name': 'English'}, {'iso_639_1': 'fr', 'name': 'Français'}]",Released,Roll the dice,Jumanji,False
False,"{'id': 119050, 'name': 'Grumpy Old Men Collection', 'poster_path': '/nLvUdqgPgm3F85NMCii9gVFUcet.jpg', 'backdrop_path': '/hypTnLot2z8wpFS7qwsQHW1uV8u.jpg'}",not_a_number,"[{'id': 10749, 'name': 'Romance'}, {'id': 35, 'name': 'Comedy'}]",15602,Grumpier Old Men,A family wedding reignites the ancient feud.,11.7129,/6ksm1sjKMFLbO7UY2i6G1ju9SML.jpg,"[{'name': 'Warner Bros.', 'id': 6194}, {'name': 'Lancaster Gate', 'id': 19464}]","[{'iso_3166_1': 'US', 'name': 'United States of America'}]",1995-12-22,0,101.0,"[{'iso_639_1': 'en',",Released,,Grumpier Old Men,False
False,,0,"[{'id': 35, 'name': 'Comedy'}]",11862,Father of the Bride Part II,Just when George Banks has recovered.,8.387519,/e64sOI48hQXyru7naBFyssKFxVd.jpg,"[{'name': 'Sandollar Productions', 'id': 5842}]","[{'iso_3166_1': 'US', 'name': 'United States of America'}]",,76578911,106.0,"[{'iso_639_1': 'en', 'name': 'English'}]",Released,,Father of the Bride Part II,False
False,nan,1234.567,[],31357,Waiting to Exhale,Cheated on and mistreated.,3.859495,/16XOMpEaLWkrcPqSQqhTmeJuqQl.jpg,[],[],1995-12-22,81452156,127.0,"[{'iso_639_1': 'en', 'name': 'English'}]",Released,,Waiting to Exhale,False
"#;

fn write_source(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("movies_metadata.csv");
    fs::write(&path, SOURCE).unwrap();
    path
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

#[test]
fn normalizes_and_exports_ten_csv_tables() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path());
    let out_dir = tmp.path().join("processed_data");

    let catalog = Pipeline::new(PipelineConfig::default())
        .run_file(&source)
        .unwrap();
    let written = export_tables(&catalog.into_named_tables(), &out_dir, ExportFormat::Csv).unwrap();
    assert_eq!(written.len(), 10);

    for name in PipelineConfig::default().table_names() {
        assert!(out_dir.join(format!("{name}.csv")).exists(), "{name}.csv missing");
    }

    // the row without a release date is gone
    let (header, movies) = read_csv(&out_dir.join("movies.csv"));
    assert_eq!(movies.len(), 4);
    assert!(!header.contains(&"tagline".to_string()));
    assert_eq!(header.last().map(String::as_str), Some("collection_name"));
    let budget = header.iter().position(|h| h == "budget").unwrap();
    assert_eq!(movies[2][budget], "", "non-numeric budget becomes missing");
    assert_eq!(movies[3][budget], "1234.57");

    let (header, collections) = read_csv(&out_dir.join("collections.csv"));
    assert_eq!(header, vec!["id", "name"]);
    assert_eq!(collections.len(), 2);

    let (_, genres) = read_csv(&out_dir.join("genres.csv"));
    let (header, links) = read_csv(&out_dir.join("genres_movies.csv"));
    assert_eq!(header, vec!["movie_id", "movie_title", "id_id", "name_name"]);
    // Comedy is shared by Toy Story and Grumpier Old Men
    assert_eq!(genres.iter().filter(|g| g[1] == "Comedy").count(), 1);
    assert_eq!(links.iter().filter(|l| l[3] == "Comedy").count(), 2);
    assert_eq!(links.len(), 8);

    let (header, languages) = read_csv(&out_dir.join("spoken_languages.csv"));
    assert_eq!(header, vec!["id", "name"]);
    assert_eq!(languages.len(), 2);
    let (_, language_links) = read_csv(&out_dir.join("spoken_languages_movies.csv"));
    // the truncated cell of Grumpier Old Men links nothing
    assert!(language_links.iter().all(|l| l[0] != "15602"));
}

#[test]
fn junction_ids_always_resolve_to_entities() {
    let tmp = TempDir::new().unwrap();
    let catalog = Pipeline::new(PipelineConfig::default())
        .run_file(&write_source(tmp.path()))
        .unwrap();

    let config = PipelineConfig::default();
    for (concept, extraction) in config.nested.iter().zip(&catalog.concepts) {
        let id_column = concept.id_alias.as_deref().unwrap_or(&concept.source.id_key);
        let ids: Vec<&Value> = extraction.entities.column_values(id_column).unwrap();
        let unique: HashSet<&Value> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "duplicate ids in {}", extraction.entities.name);

        let link_column = concept.source.junction_id_column();
        for link in extraction.junction.column_values(&link_column).unwrap() {
            assert!(unique.contains(link), "{link:?} missing from {}", extraction.entities.name);
        }
    }
}

#[test]
fn collection_annotation_matches_collection_table() {
    let tmp = TempDir::new().unwrap();
    let catalog = Pipeline::new(PipelineConfig::default())
        .run_file(&write_source(tmp.path()))
        .unwrap();

    let names: Vec<&Value> = catalog.movies.column_values("collection_name").unwrap();
    assert_eq!(names[0], &Value::from("Toy Story Collection"));
    assert_eq!(names[1], &Value::Null);
    assert_eq!(names[3], &Value::Null, "'nan' means no collection");
    assert!(!catalog.collections.has_column("poster_path"));
    assert!(!catalog.collections.has_column("backdrop_path"));
}

#[test]
fn config_file_changes_the_run() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("pipeline.toml");
    fs::write(
        &config_path,
        r#"
critical_columns = ["budget"]
precision = 0
"#,
    )
    .unwrap();

    let config = PipelineConfig::from_file(&config_path).unwrap();
    let catalog = Pipeline::new(config)
        .run_file(&write_source(tmp.path()))
        .unwrap();
    // the dateless row is kept now
    assert_eq!(catalog.movies.len(), 5);
    assert_eq!(catalog.movies.cell(4, "budget"), Some(&Value::Float(1235.0)));
}

#[test]
fn missing_configured_column_produces_no_output() {
    let tmp = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.numeric_columns.push("vote_average".into());

    let err = Pipeline::new(config)
        .run_file(&write_source(tmp.path()))
        .unwrap_err();
    assert!(format!("{err:#}").contains("vote_average"));
}

#[test]
fn parquet_export_round_trips_through_the_loader() {
    let tmp = TempDir::new().unwrap();
    let catalog = Pipeline::new(PipelineConfig::default())
        .run_file(&write_source(tmp.path()))
        .unwrap();
    let out_dir = tmp.path().join("parquet");
    export_tables(&catalog.into_named_tables(), &out_dir, ExportFormat::Parquet).unwrap();

    let genres = catalog_normalizer::data::loader::load_file(&out_dir.join("genres.parquet")).unwrap();
    assert_eq!(genres.columns, vec!["id", "name"]);
    assert_eq!(genres.cell(0, "id"), Some(&Value::Integer(16)));
    assert_eq!(genres.cell(0, "name"), Some(&Value::from("Animation")));
}
