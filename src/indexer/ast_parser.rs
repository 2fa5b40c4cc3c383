use crate::error::{CatalogError, ParseError};
use tree_sitter::{Language, Node, Parser, Tree};

/// Tree-sitter parser for Python sources
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new parser with the Python grammar loaded
    pub fn new() -> Result<Self, CatalogError> {
        let language: Language = tree_sitter_python::LANGUAGE.into();

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| CatalogError::other(format!("Failed to set parser language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse `source` into a syntax tree.
    ///
    /// Fails when tree-sitter had to recover from invalid input anywhere in the
    /// file; the error points at the first `ERROR` or `MISSING` node. The
    /// grammar also accepts Python 2 `print x` and `exec code` statements,
    /// which are rejected here as Python 3 does.
    pub fn parse(&mut self, file: &str, source: &str) -> Result<Tree, ParseError> {
        let tree = self.parser.parse(source, None).ok_or_else(|| ParseError {
            file: file.to_string(),
            line: 1,
            column: 0,
            reason: "parser produced no syntax tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let offending = first_error_node(root).unwrap_or(root);
            let position = offending.start_position();
            return Err(ParseError {
                file: file.to_string(),
                line: position.row + 1,
                column: position.column,
                reason: describe_error(offending, source),
            });
        }

        if let Some(statement) = first_python2_statement(root) {
            let position = statement.start_position();
            return Err(ParseError {
                file: file.to_string(),
                line: position.row + 1,
                column: position.column,
                reason: format!(
                    "invalid syntax: Python 2 `{}` statement",
                    statement.kind().trim_end_matches("_statement")
                ),
            });
        }

        Ok(tree)
    }
}

/// Locate the first (in source order) error or missing node under `node`
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error_node)
}

/// First `print x` / `exec code` statement in source order.
/// `print(x)` and `exec(code)` are calls and never match.
fn first_python2_statement(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if matches!(node.kind(), "print_statement" | "exec_statement") {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn describe_error(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing `{}`", node.kind());
    }

    let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
    let snippet: String = text
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(40)
        .collect();

    if snippet.is_empty() {
        "invalid syntax".to_string()
    } else {
        format!("invalid syntax near `{}`", snippet)
    }
}

/// Syntactic role of a node, as far as the catalog is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'tree> {
    /// `def` / `async def`, decorated or not
    Function(Node<'tree>),
    /// `class`
    Class(Node<'tree>),
    /// A plain `target = value` statement (possibly chained)
    Assignment(Node<'tree>),
    Other,
}

impl<'tree> NodeKind<'tree> {
    /// Tag a node. Checked in priority order: function, class, assignment.
    pub fn classify(node: Node<'tree>) -> Self {
        match node.kind() {
            "function_definition" => NodeKind::Function(node),
            "class_definition" => NodeKind::Class(node),
            "assignment" if is_plain_assignment_statement(node) => NodeKind::Assignment(node),
            _ => NodeKind::Other,
        }
    }
}

/// An assignment that forms a whole statement and binds a value without an annotation.
///
/// Inner links of a chain (`b = 1` in `a = b = 1`) sit under another
/// assignment and belong to the outer statement.
fn is_plain_assignment_statement(node: Node<'_>) -> bool {
    let at_statement_level = node
        .parent()
        .is_some_and(|parent| parent.kind() == "expression_statement");

    at_statement_level
        && node.child_by_field_name("right").is_some()
        && node.child_by_field_name("type").is_none()
}

/// Get the UTF-8 text of a node
pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.start_byte()..node.end_byte()]).unwrap_or_default()
}
