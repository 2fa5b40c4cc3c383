//! Source discovery, parsing and structural extraction
//!
//! Walks a directory for Python sources, parses each one with tree-sitter and
//! turns its functions, classes and module-level or nested assignments into
//! [`ExtractedUnit`](crate::types::ExtractedUnit)s with resolved spans.

mod ast_parser;
mod file_walker;
pub mod span;
mod walker;

pub use ast_parser::{NodeKind, PythonParser};
pub use file_walker::{DiscoveredFiles, FileWalker};
pub use span::{Span, physical_lines, resolve_assignment_span, resolve_definition_span, slice_lines};
pub use walker::extract_units;
