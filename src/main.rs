//! # Codeseer CLI
//!
//! - `codeseer build [DIR]` - Catalog a Python source tree into `code_data.json`
//! - `codeseer load [CATALOG]` - Flatten a catalog into a JSON-lines collection
//! - `codeseer locate <IDENTITY> [CATALOG]` - Trace a record back to its source
//! - `codeseer config show|path|init` - Inspect configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codeseer::catalog::{Catalog, CatalogBuilder, ProgressEvent};
use codeseer::collection::{JsonlCollection, load_catalog_with};
use codeseer::config::{Config, ParseErrorPolicy};
use codeseer::paths::PlatformPaths;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(name = "codeseer")]
#[command(about = "Structural code catalog for semantic indexing")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Path to config file (default: <config dir>/codeseer/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the catalog for a source directory
    Build {
        /// Directory to catalog (default: CODESEER_CODE_PATH, then prompt)
        dir: Option<PathBuf>,

        /// Where to write the catalog
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model whose tokenizer counts tokens
        #[arg(short, long)]
        model: Option<String>,

        /// Leave out files that fail to parse instead of stopping
        #[arg(long)]
        skip_parse_errors: bool,

        /// Parse files in parallel
        #[arg(long)]
        parallel: bool,

        /// Write the catalog without indentation
        #[arg(long)]
        compact: bool,
    },

    /// Load a catalog into a JSON-lines collection
    Load {
        /// Catalog file (default: configured output path)
        catalog: Option<PathBuf>,

        /// Collection file (default: <data dir>/codeseer/collection.jsonl)
        #[arg(long)]
        collection: Option<PathBuf>,

        /// Append to an existing collection instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Print the source location and text of a record
    Locate {
        /// Record identity
        identity: usize,

        /// Catalog file (default: configured output path)
        catalog: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print sample configuration file
    Init {
        /// Write the sample to the config file path instead of printing it
        #[arg(long)]
        write: bool,

        /// Replace an existing config file
        #[arg(long, requires = "write")]
        force: bool,
    },
    /// Show config file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = Config::new(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Build {
            dir,
            output,
            model,
            skip_parse_errors,
            parallel,
            compact,
        } => {
            let mut config = config;
            if let Some(output) = output {
                config.catalog.output_path = output;
            }
            if let Some(model) = model {
                config.tokenizer.model = model;
            }
            if skip_parse_errors {
                config.catalog.on_parse_error = ParseErrorPolicy::Skip;
            }
            if parallel {
                config.catalog.parallel_extraction = true;
            }
            if compact {
                config.catalog.pretty = false;
            }
            config.validate()?;

            let dir = match dir.or_else(|| config.code_path.clone()) {
                Some(dir) => dir,
                None => prompt_for_directory()?,
            };
            cmd_build(config, &dir)?;
        }

        Commands::Load {
            catalog,
            collection,
            append,
        } => {
            let catalog = catalog.unwrap_or_else(|| config.catalog.output_path.clone());
            let collection = collection.unwrap_or_else(|| config.collection.path.clone());
            cmd_load(&catalog, &collection, append)?;
        }

        Commands::Locate { identity, catalog } => {
            let catalog = catalog.unwrap_or_else(|| config.catalog.output_path.clone());
            cmd_locate(identity, &catalog)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", config.to_toml()?);
            }
            ConfigAction::Init { write, force } => {
                if write {
                    let path = cli
                        .config
                        .unwrap_or_else(PlatformPaths::default_config_path);
                    if path.exists() && !force {
                        anyhow::bail!(
                            "{} already exists (use --force to replace it)",
                            path.display()
                        );
                    }
                    Config::default().save(&path)?;
                    println!("Wrote {}", path.display());
                } else {
                    println!("{}", Config::default().to_toml()?);
                }
            }
            ConfigAction::Path => {
                let path = cli
                    .config
                    .unwrap_or_else(PlatformPaths::default_config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}

fn prompt_for_directory() -> Result<PathBuf> {
    print!("Please enter the directory path: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read directory path")?;
    Ok(PathBuf::from(line.trim()))
}

fn cmd_build(config: Config, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Invalid directory path: {}. Please try again.", dir.display());
    }

    let output = config.catalog.output_path.clone();
    let pretty = config.catalog.pretty;

    let mut builder = CatalogBuilder::from_config(config)
        .context("Failed to load tokenizer")?
        .with_progress(Box::new(|event: &ProgressEvent<'_>| match event {
            ProgressEvent::FileProcessed { path, .. } => {
                println!("\nProcessing file: {}", path.display());
            }
            ProgressEvent::FileSkipped { path, reason } => {
                println!("\nSkipping file: {} ({})", path.display(), reason);
            }
            ProgressEvent::RecordEnriched(record) => {
                let unit = &record.unit;
                println!(
                    "Type: {}, Name: {}, File: {}, Lines: {} - {}, Tokens: {}",
                    unit.unit_type,
                    unit.name,
                    unit.file_path,
                    unit.start_line,
                    unit.end_line,
                    record.token_count
                );
            }
        }));

    let outcome = builder
        .build(dir)
        .with_context(|| format!("Failed to catalog {}", dir.display()))?;

    outcome
        .catalog
        .write_to(&output, pretty)
        .context("Failed to write catalog")?;

    info!(
        "{} records from {} files ({} skipped) in {} ms -> {}",
        outcome.report.records,
        outcome.report.files_processed,
        outcome.report.skipped_files.len(),
        outcome.report.duration_ms,
        output.display()
    );

    Ok(())
}

fn cmd_load(catalog_path: &Path, collection_path: &Path, append: bool) -> Result<()> {
    let catalog = Catalog::read_from(catalog_path)?;

    let mut collection = if append {
        JsonlCollection::open(collection_path)?
    } else {
        JsonlCollection::create(collection_path)?
    };

    let metadata_by_id = metadata_summaries(&catalog)?;

    let report = load_catalog_with(&catalog, &mut collection, |document, result| {
        let metadata = metadata_by_id.get(&document.id).map_or("{}", String::as_str);
        println!("Adding data point {}: {}", document.id, metadata);
        match result {
            Ok(()) => println!("Data point {} added successfully.", document.id),
            Err(e) => println!("Error adding data point {}: {}", document.id, e),
        }
    })
    .context("Failed to load collection")?;

    info!(
        "Loaded {} of {} records into {}",
        report.added,
        catalog.len(),
        collection_path.display()
    );

    Ok(())
}

/// One-line JSON metadata of every record, keyed by document id
fn metadata_summaries(catalog: &Catalog) -> Result<HashMap<String, String>> {
    catalog
        .to_documents()
        .into_iter()
        .map(|document| {
            serde_json::to_string(&document.metadata).map(|metadata| (document.id, metadata))
        })
        .collect::<Result<HashMap<_, _>, serde_json::Error>>()
        .context("Failed to render record metadata")
}

fn cmd_locate(identity: usize, catalog_path: &Path) -> Result<()> {
    let catalog = Catalog::read_from(catalog_path)?;

    let record = catalog.get(identity).with_context(|| {
        format!(
            "No record with identity {} in {}",
            identity,
            catalog_path.display()
        )
    })?;

    println!("{}", record.location());
    println!();
    println!("{}", record.unit.source_text);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeseer::types::{CatalogRecord, ExtractedUnit, UnitType};

    #[test]
    fn test_metadata_summaries() {
        let catalog = Catalog::new(vec![CatalogRecord {
            identity: 0,
            unit: ExtractedUnit {
                unit_type: UnitType::Function,
                name: "run".to_string(),
                decorators: vec!["cached".to_string()],
                parameters: Some(vec!["job".to_string(), "retries".to_string()]),
                base_types: None,
                source_text: "def run(job, retries): pass".to_string(),
                file_path: "app.py".to_string(),
                start_line: 1,
                end_line: 1,
                start_col: 0,
                end_col: None,
            },
            token_count: 8,
        }]);

        let summaries = metadata_summaries(&catalog).unwrap();
        assert_eq!(summaries.len(), 1);

        let metadata: serde_json::Value = serde_json::from_str(&summaries["0"]).unwrap();
        assert_eq!(metadata["name"], "run");
        assert_eq!(metadata["parameters"], "job,retries");
        assert_eq!(metadata["decorators"], "cached");
        assert!(metadata.get("end_col").is_none());
        assert!(metadata.get("base_types").is_none());
    }

    #[test]
    fn test_metadata_summaries_empty_catalog() {
        assert!(metadata_summaries(&Catalog::default()).unwrap().is_empty());
    }
}
