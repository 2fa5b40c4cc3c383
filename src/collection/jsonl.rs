//! JSON-lines collection file
//!
//! One `{"id", "document", "metadata"}` object per line, the hand-off format
//! for an external embedder.

use super::DocumentSink;
use crate::error::{CatalogError, CatalogIoError, SinkError};
use crate::types::IndexDocument;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonlCollection {
    path: PathBuf,
    writer: BufWriter<File>,
    ids: HashSet<String>,
}

impl JsonlCollection {
    /// Start an empty collection at `path`, replacing any existing file
    pub fn create(path: &Path) -> Result<Self, CatalogError> {
        Self::ensure_parent(path)?;
        let file = File::create(path).map_err(|e| write_failed(path, e))?;

        tracing::debug!("Created collection {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            ids: HashSet::new(),
        })
    }

    /// Open a collection for appending. Ids already in the file stay reserved.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let ids: HashSet<String> = if path.exists() {
            Self::read_documents(path)?
                .into_iter()
                .map(|document| document.id)
                .collect()
        } else {
            HashSet::new()
        };

        Self::ensure_parent(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| write_failed(path, e))?;

        tracing::debug!(
            "Opened collection {} ({} existing documents)",
            path.display(),
            ids.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of documents in the collection, including ones from before `open`
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Read every document of a collection file
    pub fn read_documents(path: &Path) -> Result<Vec<IndexDocument>, CatalogError> {
        let read_failed = |reason: String| CatalogIoError::ReadFailed {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| read_failed(e.to_string()))?;
        let mut documents = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| read_failed(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let document: IndexDocument = serde_json::from_str(&line)
                .map_err(|e| read_failed(format!("line {}: {}", index + 1, e)))?;
            documents.push(document);
        }

        Ok(documents)
    }

    fn ensure_parent(path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
        }
        Ok(())
    }
}

fn write_failed(path: &Path, e: std::io::Error) -> CatalogIoError {
    CatalogIoError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl DocumentSink for JsonlCollection {
    fn add(&mut self, document: &IndexDocument) -> Result<(), SinkError> {
        let rejected = |reason: String| SinkError::RecordAddFailure {
            id: document.id.clone(),
            reason,
        };

        if self.ids.contains(&document.id) {
            return Err(rejected("id already exists in collection".to_string()));
        }

        let line = serde_json::to_string(document).map_err(|e| rejected(e.to_string()))?;
        writeln!(self.writer, "{}", line).map_err(|e| rejected(e.to_string()))?;

        self.ids.insert(document.id.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|e| SinkError::FlushFailed(format!("{}: {}", self.path.display(), e)))
    }
}
