//! Tests for catalog building and persistence

use super::*;
use crate::error::ParseError;
use crate::types::UnitType;
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::TempDir;

/// Counts whitespace-separated words, enough to tell records apart
struct WordCounter;

impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn model_name(&self) -> &str {
        "words"
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn builder(config: Config) -> CatalogBuilder {
    CatalogBuilder::new(config, Box::new(WordCounter))
}

fn sample_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "app.py",
        "LIMIT = 10\n\ndef run(job):\n    return job\n",
    );
    write(
        temp_dir.path(),
        "pkg/models.py",
        "class Model(Base):\n    def save(self):\n        pass\n",
    );
    write(temp_dir.path(), "notes.txt", "def not_python(): pass\n");
    temp_dir
}

fn skip_config() -> Config {
    let mut config = Config::default();
    config.catalog.on_parse_error = ParseErrorPolicy::Skip;
    config
}

#[test]
fn test_build_sample_tree() {
    let temp_dir = sample_tree();
    let outcome = builder(Config::default()).build(temp_dir.path()).unwrap();

    let names: Vec<(usize, UnitType, &str)> = outcome
        .catalog
        .records()
        .iter()
        .map(|r| (r.identity, r.unit.unit_type, r.unit.name.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            (0, UnitType::Variable, "LIMIT"),
            (1, UnitType::Function, "run"),
            (2, UnitType::Class, "Model"),
            (3, UnitType::Function, "save"),
        ]
    );

    assert_eq!(outcome.report.files_processed, 2);
    assert_eq!(outcome.report.records, 4);
    assert!(outcome.report.skipped_files.is_empty());
}

#[test]
fn test_token_counts_come_from_counter() {
    let temp_dir = sample_tree();
    let outcome = builder(Config::default()).build(temp_dir.path()).unwrap();

    for record in outcome.catalog.records() {
        assert_eq!(
            record.token_count,
            record.unit.source_text.split_whitespace().count()
        );
    }
    // "LIMIT = 10"
    assert_eq!(outcome.catalog.records()[0].token_count, 3);
}

#[test]
fn test_file_path_as_discovered() {
    let temp_dir = sample_tree();
    let outcome = builder(Config::default()).build(temp_dir.path()).unwrap();

    let first = &outcome.catalog.records()[0];
    assert_eq!(
        PathBuf::from(&first.unit.file_path),
        temp_dir.path().join("app.py")
    );
}

#[test]
fn test_empty_directory_builds_empty_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = builder(Config::default()).build(temp_dir.path()).unwrap();
    assert!(outcome.catalog.is_empty());
    assert_eq!(outcome.report.files_processed, 0);
}

#[test]
fn test_invalid_directory() {
    let result = builder(Config::default()).build(Path::new("/nonexistent/codeseer/root"));
    assert!(matches!(result, Err(CatalogError::Discovery(_))));
}

#[test]
fn test_parse_error_aborts_by_default() {
    let temp_dir = sample_tree();
    write(temp_dir.path(), "broken.py", "def broken(:\n    pass\n");

    let result = builder(Config::default()).build(temp_dir.path());
    match result {
        Err(CatalogError::Parse(ParseError { file, .. })) => {
            assert!(file.ends_with("broken.py"));
        }
        other => panic!("expected parse error, got {:?}", other.map(|o| o.report)),
    }
}

#[test]
fn test_parse_error_skipped_under_skip_policy() {
    let temp_dir = sample_tree();
    write(temp_dir.path(), "broken.py", "def broken(:\n    pass\n");

    let outcome = builder(skip_config()).build(temp_dir.path()).unwrap();

    assert_eq!(outcome.catalog.len(), 4);
    assert_eq!(outcome.report.files_processed, 2);
    assert_eq!(outcome.report.skipped_files.len(), 1);
    assert!(outcome.report.skipped_files[0].path.ends_with("broken.py"));
    // Identities stay dense
    let identities: Vec<usize> = outcome.catalog.records().iter().map(|r| r.identity).collect();
    assert_eq!(identities, vec![0, 1, 2, 3]);
}

#[test]
fn test_invalid_utf8_follows_policy() {
    let temp_dir = sample_tree();
    fs::write(temp_dir.path().join("latin1.py"), [b'x', b'=', 0xE9, b'\n']).unwrap();

    let aborted = builder(Config::default()).build(temp_dir.path());
    assert!(matches!(
        aborted,
        Err(CatalogError::CatalogIo(CatalogIoError::FileReadFailed { .. }))
    ));

    let outcome = builder(skip_config()).build(temp_dir.path()).unwrap();
    assert_eq!(outcome.report.skipped_files.len(), 1);
    assert_eq!(outcome.catalog.len(), 4);
}

#[test]
fn test_byte_order_mark_is_stripped() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "bom.py", "\u{feff}VALUE = 1\n");

    let outcome = builder(Config::default()).build(temp_dir.path()).unwrap();
    let record = &outcome.catalog.records()[0];
    assert_eq!(record.unit.name, "VALUE");
    assert_eq!(record.unit.start_col, 0);
    assert_eq!(record.unit.source_text, "VALUE = 1");
}

#[test]
fn test_parallel_build_matches_sequential() {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..12 {
        write(
            temp_dir.path(),
            &format!("mod_{:02}.py", i),
            &format!("X{i} = {i}\n\ndef f{i}(a):\n    return a\n"),
        );
    }

    let sequential = builder(Config::default()).build(temp_dir.path()).unwrap();

    let mut config = Config::default();
    config.catalog.parallel_extraction = true;
    let parallel = builder(config).build(temp_dir.path()).unwrap();

    assert_eq!(sequential.catalog, parallel.catalog);
    assert_eq!(parallel.catalog.len(), 24);
}

#[test]
fn test_parallel_build_reports_first_failure_in_order() {
    let temp_dir = sample_tree();
    write(temp_dir.path(), "a_broken.py", "class :\n");
    write(temp_dir.path(), "z_broken.py", "def z(:\n");

    let mut config = Config::default();
    config.catalog.parallel_extraction = true;
    match builder(config).build(temp_dir.path()) {
        Err(CatalogError::Parse(err)) => assert!(err.file.ends_with("a_broken.py")),
        other => panic!("expected parse error, got {:?}", other.map(|o| o.report)),
    }
}

#[test]
fn test_progress_events() {
    let temp_dir = sample_tree();
    write(temp_dir.path(), "broken.py", "def broken(:\n");

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    let progress: ProgressCallback = Box::new(move |event: &ProgressEvent<'_>| {
        let line = match event {
            ProgressEvent::FileProcessed { units, .. } => format!("file:{}", units),
            ProgressEvent::FileSkipped { .. } => "skipped".to_string(),
            ProgressEvent::RecordEnriched(record) => format!("record:{}", record.identity),
        };
        sink.borrow_mut().push(line);
    });
    let mut catalog_builder = builder(skip_config()).with_progress(progress);
    catalog_builder.build(temp_dir.path()).unwrap();

    // app.py, broken.py, pkg/models.py in walk order, then enrichment
    assert_eq!(
        *events.borrow(),
        vec![
            "file:2", "skipped", "file:2", "record:0", "record:1", "record:2", "record:3",
        ]
    );
}

#[test]
fn test_catalog_get() {
    let temp_dir = sample_tree();
    let catalog = builder(Config::default())
        .build(temp_dir.path())
        .unwrap()
        .catalog;

    assert_eq!(catalog.get(1).map(|r| r.unit.name.as_str()), Some("run"));
    assert!(catalog.get(99).is_none());
}

#[test]
fn test_write_and_read_back() {
    let temp_dir = sample_tree();
    let catalog = builder(Config::default())
        .build(temp_dir.path())
        .unwrap()
        .catalog;

    let output = temp_dir.path().join("out/nested/code_data.json");
    catalog.write_to(&output, true).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("[\n  {\n"));
    assert!(content.contains("\"unit_type\": \"variable\""));

    let read_back = Catalog::read_from(&output).unwrap();
    assert_eq!(read_back, catalog);
}

#[test]
fn test_compact_output() {
    let catalog = Catalog::default();
    assert_eq!(catalog.to_json(false).unwrap(), "[]");
    assert_eq!(catalog.to_json(true).unwrap(), "[]");
}

#[test]
fn test_rebuild_is_byte_identical() {
    let temp_dir = sample_tree();
    let first = builder(Config::default())
        .build(temp_dir.path())
        .unwrap()
        .catalog
        .to_json(true)
        .unwrap();
    let second = builder(Config::default())
        .build(temp_dir.path())
        .unwrap()
        .catalog
        .to_json(true)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_read_missing_catalog() {
    let result = Catalog::read_from(Path::new("/nonexistent/code_data.json"));
    assert!(matches!(
        result,
        Err(CatalogError::CatalogIo(CatalogIoError::ReadFailed { .. }))
    ));
}

#[test]
fn test_read_malformed_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.json");
    fs::write(&path, "{\"not\": \"an array\"}").unwrap();

    assert!(Catalog::read_from(&path).is_err());
}

#[test]
fn test_to_documents() {
    let temp_dir = sample_tree();
    let catalog = builder(Config::default())
        .build(temp_dir.path())
        .unwrap()
        .catalog;

    let documents = catalog.to_documents();
    assert_eq!(documents.len(), catalog.len());
    assert_eq!(documents[2].id, "2");
    assert_eq!(documents[2].metadata["base_types"], "Base");
}
