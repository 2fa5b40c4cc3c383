//! # Codeseer - Structural Code Catalog for Semantic Indexing
//!
//! Walks a Python source tree, extracts every function, class and simple
//! variable assignment, and writes them to a JSON catalog with precise
//! source spans and token counts. The catalog is the input to an embedding
//! pipeline; each record can be traced back to its file and line range.
//!
//! ## Pipeline
//!
//! ```text
//! directory ──► FileWalker ──► PythonParser ──► extract_units
//!                                                    │
//!   code_data.json ◄── Catalog ◄── TokenCounter ◄────┘
//!         │
//!         └──► DocumentSink (JsonlCollection, MemoryCollection)
//! ```
//!
//! ## Modules
//!
//! - [`indexer`]: File discovery, tree-sitter parsing, span resolution and the structural walk
//! - [`tokenizer`]: Token counting with tiktoken BPEs
//! - [`catalog`]: Two-pass catalog building and the JSON artifact
//! - [`collection`]: Flattening catalog records into document sinks
//! - [`config`]: Configuration management with environment variable support
//! - [`types`]: Catalog record types
//! - [`error`]: Error types and result aliases
//! - [`paths`]: Platform directories
//!
//! ## Usage Example
//!
//! ```no_run
//! use codeseer::catalog::CatalogBuilder;
//! use codeseer::config::Config;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::new(None)?;
//!     let output = config.catalog.output_path.clone();
//!
//!     let mut builder = CatalogBuilder::from_config(config)?;
//!     let outcome = builder.build(Path::new("./my_project"))?;
//!     outcome.catalog.write_to(&output, true)?;
//!
//!     println!("{} records", outcome.report.records);
//!     Ok(())
//! }
//! ```

/// Two-pass catalog building and the catalog artifact
pub mod catalog;

/// Loading catalogs into document collections
pub mod collection;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Glob pattern matching for exclude lists
pub mod glob_utils;

/// File discovery, AST parsing and structural extraction
pub mod indexer;

/// Platform directories for config and data files
pub mod paths;

/// Token counting for catalog records
pub mod tokenizer;

/// Catalog record types
pub mod types;
