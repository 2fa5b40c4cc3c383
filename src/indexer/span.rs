//! Source span resolution for catalog units
//!
//! Lines are 1-based and inclusive, columns are 0-based byte offsets, matching
//! what tree-sitter reports for rows and columns.

use tree_sitter::{Node, Point};

/// Line/column range of a unit plus the text it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: Option<usize>,
    pub source_text: String,
}

/// Span of a `def`/`class` node.
///
/// Starts at the definition keyword (decorators are not part of the span) and
/// ends at the last statement of the body. A definition whose body exposes no
/// statement collapses to its first line with no end column.
pub fn resolve_definition_span(definition: Node<'_>, lines: &[&str]) -> Span {
    let start = definition.start_position();
    let start_line = start.row + 1;

    let last_statement = definition
        .child_by_field_name("body")
        .and_then(last_code_child);

    let (end_line, end_col) = match last_statement {
        Some(statement) => {
            let end = code_end(statement);
            (end.row + 1, Some(end.column))
        }
        None => (start_line, None),
    };

    Span {
        start_line,
        end_line,
        start_col: start.column,
        end_col,
        source_text: slice_lines(lines, start_line, end_line),
    }
}

/// Span of an assignment target: the statement's lines with the target's columns
pub fn resolve_assignment_span(statement: Node<'_>, target: Node<'_>, lines: &[&str]) -> Span {
    let start_line = statement.start_position().row + 1;
    let end_line = code_end(statement).row + 1;

    Span {
        start_line,
        end_line,
        start_col: target.start_position().column,
        end_col: Some(target.end_position().column),
        source_text: slice_lines(lines, start_line, end_line),
    }
}

/// Text of lines `start_line..=end_line` (1-based), trimmed as one block.
///
/// Indices beyond the file are clamped.
pub fn slice_lines(lines: &[&str], start_line: usize, end_line: usize) -> String {
    let start = start_line.saturating_sub(1).min(lines.len());
    let end = end_line.min(lines.len()).max(start);
    lines[start..end].concat().trim().to_string()
}

/// Split source into physical lines, keeping terminators
pub fn physical_lines(source: &str) -> Vec<&str> {
    source.split_inclusive('\n').collect()
}

/// Last child of `node` that is code rather than a comment
fn last_code_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().rev().find(|child| child.kind() != "comment")
}

/// End position of the last code token under `node`.
///
/// Trailing comments inside nested blocks extend a node's range in the tree,
/// but do not belong to the statement.
fn code_end(node: Node<'_>) -> Point {
    let mut current = node;
    while let Some(child) = last_code_child(current) {
        current = child;
    }
    current.end_position()
}
