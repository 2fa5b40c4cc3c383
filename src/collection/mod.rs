//! Loading a catalog into a document collection
//!
//! A collection is the sink side of the catalog: each record is flattened to
//! an [`IndexDocument`] and handed to a [`DocumentSink`]. A record the sink
//! refuses is logged and counted, and loading carries on with the next one.

mod jsonl;
mod memory;

pub use jsonl::JsonlCollection;
pub use memory::MemoryCollection;

use crate::catalog::Catalog;
use crate::error::SinkError;
use crate::types::IndexDocument;

/// Destination for flattened catalog records
pub trait DocumentSink {
    /// Add one document. Fails with [`SinkError::RecordAddFailure`] when the
    /// document is rejected.
    fn add(&mut self, document: &IndexDocument) -> Result<(), SinkError>;

    /// Make every added document durable
    fn flush(&mut self) -> Result<(), SinkError>;
}

/// Outcome of loading a catalog into a sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub added: usize,
    pub failures: Vec<SinkError>,
}

/// Load every record of `catalog` into `sink`, then flush it
pub fn load_catalog(catalog: &Catalog, sink: &mut dyn DocumentSink) -> Result<LoadReport, SinkError> {
    load_catalog_with(catalog, sink, |_, _| {})
}

/// Like [`load_catalog`], calling `on_record` with each document and its add result
pub fn load_catalog_with<F>(
    catalog: &Catalog,
    sink: &mut dyn DocumentSink,
    mut on_record: F,
) -> Result<LoadReport, SinkError>
where
    F: FnMut(&IndexDocument, &Result<(), SinkError>),
{
    let mut report = LoadReport::default();

    for record in catalog.records() {
        let document = record.to_document();
        let result = sink.add(&document);
        on_record(&document, &result);

        match result {
            Ok(()) => report.added += 1,
            Err(e) => {
                tracing::warn!("{}", e);
                report.failures.push(e);
            }
        }
    }

    sink.flush()?;

    tracing::info!(
        "Loaded {} documents ({} failed)",
        report.added,
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogRecord, ExtractedUnit, UnitType};

    fn record(identity: usize, name: &str) -> CatalogRecord {
        CatalogRecord {
            identity,
            unit: ExtractedUnit {
                unit_type: UnitType::Variable,
                name: name.to_string(),
                decorators: vec![],
                parameters: None,
                base_types: None,
                source_text: format!("{} = 1", name),
                file_path: "m.py".to_string(),
                start_line: identity + 1,
                end_line: identity + 1,
                start_col: 0,
                end_col: Some(name.len()),
            },
            token_count: 3,
        }
    }

    /// Sink whose flush always fails
    struct BrokenSink;

    impl DocumentSink for BrokenSink {
        fn add(&mut self, _document: &IndexDocument) -> Result<(), SinkError> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), SinkError> {
            Err(SinkError::FlushFailed("disk full".to_string()))
        }
    }

    #[test]
    fn test_load_catalog() {
        let catalog = Catalog::new(vec![record(0, "a"), record(1, "b")]);
        let mut sink = MemoryCollection::new();

        let report = load_catalog(&catalog, &mut sink).unwrap();
        assert_eq!(report.added, 2);
        assert!(report.failures.is_empty());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.get("1").map(|d| d.document.as_str()), Some("b = 1"));
    }

    #[test]
    fn test_load_continues_past_rejected_record() {
        // A hand-edited catalog with a repeated identity
        let catalog = Catalog::new(vec![record(0, "a"), record(0, "dup"), record(2, "c")]);
        let mut sink = MemoryCollection::new();

        let report = load_catalog(&catalog, &mut sink).unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(
            report.failures,
            vec![SinkError::RecordAddFailure {
                id: "0".to_string(),
                reason: "id already exists in collection".to_string(),
            }]
        );
        assert!(sink.get("2").is_some());
    }

    #[test]
    fn test_load_reports_each_record() {
        let catalog = Catalog::new(vec![record(0, "a"), record(0, "dup")]);
        let mut sink = MemoryCollection::new();
        let mut seen = Vec::new();

        load_catalog_with(&catalog, &mut sink, |document, result| {
            seen.push((document.id.clone(), result.is_ok()));
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![("0".to_string(), true), ("0".to_string(), false)]
        );
    }

    #[test]
    fn test_flush_failure_is_fatal() {
        let catalog = Catalog::new(vec![record(0, "a")]);
        let result = load_catalog(&catalog, &mut BrokenSink);
        assert!(matches!(result, Err(SinkError::FlushFailed(_))));
    }

    #[test]
    fn test_empty_catalog() {
        let mut sink = MemoryCollection::new();
        let report = load_catalog(&Catalog::default(), &mut sink).unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(sink.is_empty());
    }
}
