//! Catalog building and the catalog artifact
//!
//! A build runs in two passes. The first walks the directory and extracts
//! units file by file; the second counts tokens for every unit and assigns
//! identities in accumulated order. Nothing is persisted until the caller
//! writes the finished [`Catalog`].

use crate::config::{Config, ParseErrorPolicy};
use crate::error::{CatalogError, CatalogIoError};
use crate::indexer::{FileWalker, PythonParser, extract_units};
use crate::tokenizer::{TiktokenCounter, TokenCounter};
use crate::types::{CatalogRecord, ExtractedUnit, IndexDocument};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Ordered list of catalog records, serialized as a bare JSON array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
}

impl Catalog {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by identity
    pub fn get(&self, identity: usize) -> Option<&CatalogRecord> {
        // Identities are dense in a freshly built catalog
        match self.records.get(identity) {
            Some(record) if record.identity == identity => Some(record),
            _ => self.records.iter().find(|r| r.identity == identity),
        }
    }

    /// Flatten every record for a vector-store collection
    pub fn to_documents(&self) -> Vec<IndexDocument> {
        self.records.iter().map(CatalogRecord::to_document).collect()
    }

    /// Render as a JSON array, indented by two spaces when `pretty`
    pub fn to_json(&self, pretty: bool) -> Result<String, CatalogError> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.map_err(|e| CatalogIoError::Serialization(e.to_string()).into())
    }

    /// Write the catalog artifact in a single write, creating parent directories
    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<(), CatalogError> {
        let write_failed = |e: std::io::Error| CatalogIoError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let content = self.to_json(pretty)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        fs::write(path, content).map_err(write_failed)?;

        tracing::info!("Wrote {} records to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a catalog artifact back
    pub fn read_from(path: &Path) -> Result<Self, CatalogError> {
        let read_failed = |reason: String| CatalogIoError::ReadFailed {
            path: path.display().to_string(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| read_failed(e.to_string()))?;
        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|e| read_failed(e.to_string()))?;

        tracing::debug!("Read {} records from {}", catalog.len(), path.display());
        Ok(catalog)
    }
}

/// Progress notifications emitted while a build runs
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    /// A file was parsed and its units accumulated
    FileProcessed { path: &'a Path, units: usize },
    /// A file was left out under [`ParseErrorPolicy::Skip`]
    FileSkipped { path: &'a Path, reason: &'a str },
    /// A record received its identity and token count
    RecordEnriched(&'a CatalogRecord),
}

pub type ProgressCallback = Box<dyn FnMut(&ProgressEvent<'_>)>;

/// A file left out of the catalog, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub files_processed: usize,
    pub records: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub catalog: Catalog,
    pub report: BuildReport,
}

/// Drives discovery, extraction and enrichment for one directory tree
pub struct CatalogBuilder {
    config: Config,
    counter: Box<dyn TokenCounter>,
    progress: Option<ProgressCallback>,
}

impl CatalogBuilder {
    pub fn new(config: Config, counter: Box<dyn TokenCounter>) -> Self {
        Self {
            config,
            counter,
            progress: None,
        }
    }

    /// Builder using the tiktoken counter named by the configuration
    pub fn from_config(config: Config) -> Result<Self, CatalogError> {
        let counter = TiktokenCounter::from_config(&config.tokenizer)?;
        Ok(Self::new(config, Box::new(counter)))
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Build the catalog for every source file under `root`.
    ///
    /// Under [`ParseErrorPolicy::Abort`] the first file that cannot be read or
    /// parsed ends the build with that error.
    pub fn build(&mut self, root: &Path) -> Result<BuildOutcome, CatalogError> {
        let start = Instant::now();
        let walker = FileWalker::from_config(root, &self.config.discovery);

        tracing::info!("Cataloging {}", root.display());

        let paths = walker.walk()?.filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {}", e);
                None
            }
        });

        let mut accumulator = Accumulator::default();

        if self.config.catalog.parallel_extraction {
            let paths: Vec<PathBuf> = paths.collect();
            tracing::debug!("Extracting {} files in parallel", paths.len());

            let results: Vec<(PathBuf, Result<Vec<ExtractedUnit>, CatalogError>)> = paths
                .into_par_iter()
                .map_init(PythonParser::new, |parser, path| {
                    let result = match parser {
                        Ok(parser) => extract_file(parser, &path),
                        Err(e) => Err(CatalogError::other(e.to_string())),
                    };
                    (path, result)
                })
                .collect();

            for (path, result) in results {
                self.absorb(&path, result, &mut accumulator)?;
            }
        } else {
            let mut parser = PythonParser::new()?;
            for path in paths {
                let result = extract_file(&mut parser, &path);
                self.absorb(&path, result, &mut accumulator)?;
            }
        }

        let Accumulator {
            units,
            files_processed,
            skipped_files,
        } = accumulator;

        tracing::info!(
            "Extracted {} units from {} files ({} skipped)",
            units.len(),
            files_processed,
            skipped_files.len()
        );

        let records = self.enrich(units);
        let report = BuildReport {
            files_processed,
            records: records.len(),
            skipped_files,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Catalog built: {} records in {} ms",
            report.records,
            report.duration_ms
        );

        Ok(BuildOutcome {
            catalog: Catalog::new(records),
            report,
        })
    }

    /// Apply the parse-error policy to one file's extraction result
    fn absorb(
        &mut self,
        path: &Path,
        result: Result<Vec<ExtractedUnit>, CatalogError>,
        accumulator: &mut Accumulator,
    ) -> Result<(), CatalogError> {
        match result {
            Ok(units) => {
                tracing::debug!("{}: {} units", path.display(), units.len());
                self.emit(&ProgressEvent::FileProcessed {
                    path,
                    units: units.len(),
                });
                accumulator.files_processed += 1;
                accumulator.units.extend(units);
                Ok(())
            }
            Err(e)
                if self.config.catalog.on_parse_error == ParseErrorPolicy::Skip
                    && is_per_file(&e) =>
            {
                let reason = e.to_string();
                tracing::warn!("Skipping {}: {}", path.display(), reason);
                self.emit(&ProgressEvent::FileSkipped {
                    path,
                    reason: &reason,
                });
                accumulator.skipped_files.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason,
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Second pass: token counts and identities in accumulated order
    fn enrich(&mut self, units: Vec<ExtractedUnit>) -> Vec<CatalogRecord> {
        tracing::debug!(
            "Counting tokens for {} units with {}",
            units.len(),
            self.counter.model_name()
        );

        let mut records = Vec::with_capacity(units.len());
        for (identity, unit) in units.into_iter().enumerate() {
            let token_count = self.counter.count_tokens(&unit.source_text);
            let record = CatalogRecord {
                identity,
                unit,
                token_count,
            };
            self.emit(&ProgressEvent::RecordEnriched(&record));
            records.push(record);
        }
        records
    }

    fn emit(&mut self, event: &ProgressEvent<'_>) {
        if let Some(progress) = self.progress.as_mut() {
            progress(event);
        }
    }
}

#[derive(Default)]
struct Accumulator {
    units: Vec<ExtractedUnit>,
    files_processed: usize,
    skipped_files: Vec<SkippedFile>,
}

/// Failures confined to a single file, which the skip policy may pass over
fn is_per_file(error: &CatalogError) -> bool {
    matches!(
        error,
        CatalogError::Parse(_) | CatalogError::CatalogIo(CatalogIoError::FileReadFailed { .. })
    )
}

/// Read, parse and extract one source file
pub fn extract_file(
    parser: &mut PythonParser,
    path: &Path,
) -> Result<Vec<ExtractedUnit>, CatalogError> {
    let file = path.to_string_lossy();
    let read_failed = |reason: String| CatalogIoError::FileReadFailed {
        file: file.to_string(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| read_failed(e.to_string()))?;
    let source =
        String::from_utf8(bytes).map_err(|e| read_failed(format!("not valid UTF-8: {}", e)))?;
    let source = source.strip_prefix('\u{feff}').unwrap_or(&source);

    let tree = parser.parse(&file, source)?;
    Ok(extract_units(&file, source, &tree))
}

#[cfg(test)]
mod tests;
