//! In-memory collection, mainly for tests and dry runs

use super::DocumentSink;
use crate::error::SinkError;
use crate::types::IndexDocument;
use std::collections::HashMap;

/// Keeps documents in insertion order and refuses repeated ids
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: Vec<IndexDocument>,
    positions: HashMap<String, usize>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&IndexDocument> {
        self.positions.get(id).map(|&i| &self.documents[i])
    }

    pub fn documents(&self) -> &[IndexDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSink for MemoryCollection {
    fn add(&mut self, document: &IndexDocument) -> Result<(), SinkError> {
        if self.positions.contains_key(&document.id) {
            return Err(SinkError::RecordAddFailure {
                id: document.id.clone(),
                reason: "id already exists in collection".to_string(),
            });
        }

        self.positions
            .insert(document.id.clone(), self.documents.len());
        self.documents.push(document.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
