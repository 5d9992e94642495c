use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use catalog_normalizer::PipelineConfig;
use catalog_normalizer::data::export::{ExportFormat, export_tables};
use catalog_normalizer::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "catalog-normalizer")]
#[command(about = "Split a movie catalog's nested columns into entity and junction tables", long_about = None)]
struct Cli {
    /// Source table (.csv, .json or .parquet)
    input: PathBuf,

    /// Directory the ten output tables are written to
    #[arg(short, long, env = "CATALOG_OUTPUT_DIR", default_value = "processed_data")]
    output: PathBuf,

    /// TOML file overriding the default column configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file format
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let catalog = Pipeline::new(config).run_file(&cli.input)?;
    export_tables(&catalog.into_named_tables(), &cli.output, cli.format)?;

    info!("Tables saved to '{}'", cli.output.display());
    Ok(())
}
