//! Structural walk over a parsed file
//!
//! Produces one [`ExtractedUnit`] per function, class and simple-name
//! assignment target. Every node is visited exactly once, and the walk
//! descends into the body of each unit it emits, so nested definitions
//! become records of their own.

use super::ast_parser::{NodeKind, node_text};
use super::span::{Span, physical_lines, resolve_assignment_span, resolve_definition_span};
use crate::types::{ExtractedUnit, UnitType};
use tree_sitter::{Node, Tree};

/// Extract all catalog units from one parsed file, in depth-first source order
pub fn extract_units(file_path: &str, source: &str, tree: &Tree) -> Vec<ExtractedUnit> {
    let lines = physical_lines(source);
    let walker = StructuralWalker {
        file_path,
        source: source.as_bytes(),
        lines: &lines,
    };

    let mut units = Vec::new();
    walker.walk(tree.root_node(), &mut units);
    units
}

struct StructuralWalker<'a> {
    file_path: &'a str,
    source: &'a [u8],
    lines: &'a [&'a str],
}

impl StructuralWalker<'_> {
    /// Pre-order traversal with an explicit stack so deeply nested code cannot
    /// exhaust the call stack.
    fn walk(&self, root: Node<'_>, units: &mut Vec<ExtractedUnit>) {
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            match NodeKind::classify(node) {
                NodeKind::Function(def) => units.extend(self.function_unit(def)),
                NodeKind::Class(def) => units.extend(self.class_unit(def)),
                NodeKind::Assignment(statement) => units.extend(self.variable_units(statement)),
                NodeKind::Other => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn function_unit(&self, def: Node<'_>) -> Option<ExtractedUnit> {
        let name = self.name_of(def)?;
        let parameters = def
            .child_by_field_name("parameters")
            .map(|params| self.positional_parameters(params))
            .unwrap_or_default();

        let span = resolve_definition_span(def, self.lines);
        tracing::trace!("function {} at {}:{}", name, self.file_path, span.start_line);

        Some(self.unit(
            UnitType::Function,
            name,
            self.decorators_of(def),
            Some(parameters),
            None,
            span,
        ))
    }

    fn class_unit(&self, def: Node<'_>) -> Option<ExtractedUnit> {
        let name = self.name_of(def)?;
        let base_types = def
            .child_by_field_name("superclasses")
            .map(|bases| self.bare_name_bases(bases))
            .unwrap_or_default();

        let span = resolve_definition_span(def, self.lines);
        tracing::trace!("class {} at {}:{}", name, self.file_path, span.start_line);

        Some(self.unit(
            UnitType::Class,
            name,
            self.decorators_of(def),
            None,
            Some(base_types),
            span,
        ))
    }

    /// One unit per identifier target along an assignment chain
    /// (`a = b = 1` binds `a` and `b`); every unit covers the whole statement.
    fn variable_units(&self, statement: Node<'_>) -> Vec<ExtractedUnit> {
        let mut units = Vec::new();
        let mut link = Some(statement);

        while let Some(assignment) = link {
            if let Some(target) = assignment
                .child_by_field_name("left")
                .and_then(name_target)
            {
                let name = node_text(target, self.source).to_string();
                let span = resolve_assignment_span(statement, target, self.lines);
                units.push(self.unit(UnitType::Variable, name, Vec::new(), None, None, span));
            }

            link = assignment
                .child_by_field_name("right")
                .filter(|right| right.kind() == "assignment");
        }

        units
    }

    fn name_of(&self, def: Node<'_>) -> Option<String> {
        def.child_by_field_name("name")
            .map(|name| node_text(name, self.source).to_string())
    }

    /// Bare-name decorators of a definition wrapped in `decorated_definition`.
    /// Calls (`@cache(size=1)`) and attributes (`@app.route`) are left out.
    fn decorators_of(&self, def: Node<'_>) -> Vec<String> {
        let Some(parent) = def.parent().filter(|p| p.kind() == "decorated_definition") else {
            return Vec::new();
        };

        let mut cursor = parent.walk();
        parent
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .filter_map(|decorator| {
                let mut inner = decorator.walk();
                let expression = decorator
                    .named_children(&mut inner)
                    .find(|child| child.kind() != "comment")?;
                self.bare_name(expression)
            })
            .collect()
    }

    /// Names from the superclass list that are plain identifiers.
    /// `metaclass=...`, `pkg.Base`, `Generic[T]` and `*bases` are left out.
    fn bare_name_bases(&self, argument_list: Node<'_>) -> Vec<String> {
        let mut cursor = argument_list.walk();
        argument_list
            .named_children(&mut cursor)
            .filter_map(|argument| self.bare_name(argument))
            .collect()
    }

    /// Positional-or-keyword parameter names, in order.
    ///
    /// Names before a `/` are positional-only and dropped; everything from the
    /// first `*`, `*args` or `**kwargs` onwards is keyword-only or variadic.
    fn positional_parameters(&self, parameters: Node<'_>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = parameters.walk();

        for parameter in parameters.named_children(&mut cursor) {
            match parameter.kind() {
                "identifier" => names.push(node_text(parameter, self.source).to_string()),
                "typed_parameter" => {
                    let mut inner = parameter.walk();
                    let first = parameter.named_children(&mut inner).next();
                    match first {
                        Some(name) if name.kind() == "identifier" => {
                            names.push(node_text(name, self.source).to_string())
                        }
                        // `*args: int` / `**kw: str`
                        _ => break,
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = parameter
                        .child_by_field_name("name")
                        .filter(|name| name.kind() == "identifier")
                    {
                        names.push(node_text(name, self.source).to_string());
                    }
                }
                "positional_separator" => names.clear(),
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                _ => {}
            }
        }

        names
    }

    /// Text of `expression` when it is a plain identifier (parentheses allowed)
    fn bare_name(&self, expression: Node<'_>) -> Option<String> {
        match expression.kind() {
            "identifier" => Some(node_text(expression, self.source).to_string()),
            "parenthesized_expression" => {
                let mut cursor = expression.walk();
                let inner = expression
                    .named_children(&mut cursor)
                    .find(|child| child.kind() != "comment")?;
                self.bare_name(inner)
            }
            _ => None,
        }
    }

    fn unit(
        &self,
        unit_type: UnitType,
        name: String,
        decorators: Vec<String>,
        parameters: Option<Vec<String>>,
        base_types: Option<Vec<String>>,
        span: Span,
    ) -> ExtractedUnit {
        ExtractedUnit {
            unit_type,
            name,
            decorators,
            parameters,
            base_types,
            source_text: span.source_text,
            file_path: self.file_path.to_string(),
            start_line: span.start_line,
            end_line: span.end_line,
            start_col: span.start_col,
            end_col: span.end_col,
        }
    }
}

/// The identifier bound by an assignment target: a bare name, possibly in
/// redundant parentheses (`(a) = 1`). `(a,) = 1` is a tuple and binds nothing.
fn name_target(target: Node<'_>) -> Option<Node<'_>> {
    match target.kind() {
        "identifier" => Some(target),
        "tuple_pattern" | "parenthesized_expression" => {
            let mut cursor = target.walk();
            let has_comma = target.children(&mut cursor).any(|child| child.kind() == ",");
            let mut cursor = target.walk();
            let mut inner = target
                .named_children(&mut cursor)
                .filter(|child| child.kind() != "comment");
            match (inner.next(), inner.next()) {
                (Some(only), None) if !has_comma => name_target(only),
                _ => None,
            }
        }
        _ => None,
    }
}
