use super::{Outline, OutlineNode, StructureParser};
use crate::error::{ChunkerError, Result};
use crate::language::{Language, NodeTypes};
use crate::types::HierarchyLevel;
use tree_sitter::{Node, Parser};

/// Tree-sitter backed structure parser
pub struct GrammarParser {
    parser: Parser,
    language: Language,
    node_types: &'static NodeTypes,
    statement_level: bool,
}

enum Visit {
    Descend,
    Skip,
}

impl GrammarParser {
    /// Load the grammar for `language`
    pub fn new(language: Language, statement_level: bool) -> Result<Self> {
        let grammar = language
            .grammar()
            .ok_or_else(|| ChunkerError::unsupported_language(language.as_str()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ChunkerError::parser_init(language.as_str(), e.to_string()))?;

        Ok(Self {
            parser,
            language,
            node_types: language.node_types(),
            statement_level,
        })
    }

    pub const fn language(&self) -> Language {
        self.language
    }

    fn node(
        &self,
        node: Node<'_>,
        source: &[u8],
        level: HierarchyLevel,
        parent: Option<usize>,
    ) -> OutlineNode {
        OutlineNode {
            level,
            kind: node.kind().to_string(),
            name: if level == HierarchyLevel::Statement {
                None
            } else {
                symbol_name(node, source)
            },
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            parent,
        }
    }
}

impl StructureParser for GrammarParser {
    fn parse(&mut self, source: &[u8]) -> Result<Outline> {
        let tree = self.parser.parse(source, None).ok_or_else(|| {
            ChunkerError::parse_failure(self.language.as_str(), "parser returned no tree")
        })?;
        let root = tree.root_node();
        let types = self.node_types;
        let mut outline = Outline::default();

        // Level 3: every class-like node, at any depth
        let mut classes = Vec::new();
        walk(root, |node| {
            if types.is_class(node.kind()) {
                classes.push(node);
            }
            Visit::Descend
        });

        let mut functions: Vec<(Node<'_>, usize)> = Vec::new();
        let mut class_indices: Vec<usize> = Vec::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            // Pre-order: the nearest earlier class that spans this one is its owner
            let owner = (0..i)
                .rev()
                .find(|&j| spans(classes[j], *class))
                .map(|j| class_indices[j]);
            let class_idx = outline.push(self.node(*class, source, HierarchyLevel::Class, owner));
            class_indices.push(class_idx);
            // Level 4 inside this class; nested classes own their own methods
            let mut methods = Vec::new();
            walk(*class, |node| {
                if types.is_class(node.kind()) {
                    return Visit::Skip;
                }
                if types.is_function(node.kind()) {
                    methods.push(node);
                }
                Visit::Descend
            });
            for method in methods {
                let idx =
                    outline.push(self.node(method, source, HierarchyLevel::Function, Some(class_idx)));
                functions.push((method, idx));
            }
        }

        // Level 4 outside any class range
        let class_ranges: Vec<(usize, usize)> = classes
            .iter()
            .map(|c| (c.start_position().row, c.end_position().row))
            .collect();
        let mut top_level = Vec::new();
        walk(root, |node| {
            if types.is_function(node.kind()) {
                let (start, end) = (node.start_position().row, node.end_position().row);
                let inside_class = class_ranges.iter().any(|&(s, e)| s <= start && end <= e);
                if !inside_class {
                    top_level.push(node);
                }
            }
            Visit::Descend
        });
        for function in top_level {
            let idx = outline.push(self.node(function, source, HierarchyLevel::Function, None));
            functions.push((function, idx));
        }

        if !self.statement_level {
            return Ok(outline);
        }

        // Level 5: outermost statements of each function body
        for (function, function_idx) in functions {
            let mut statements = Vec::new();
            walk(function, |node| {
                let kind = node.kind();
                if types.is_function(kind) || types.is_class(kind) {
                    return Visit::Skip;
                }
                if types.is_statement(kind) {
                    statements.push(node);
                    return Visit::Skip;
                }
                Visit::Descend
            });
            for statement in statements {
                outline.push(self.node(
                    statement,
                    source,
                    HierarchyLevel::Statement,
                    Some(function_idx),
                ));
            }
        }

        Ok(outline)
    }
}

fn spans(outer: Node<'_>, inner: Node<'_>) -> bool {
    outer.start_byte() <= inner.start_byte() && inner.end_byte() <= outer.end_byte()
}

/// Pre-order walk over the descendants of `root` (not `root` itself).
///
/// Iterative so deeply nested sources cannot exhaust the stack.
fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> Visit) {
    let mut stack: Vec<Node<'t>> = Vec::new();
    push_children(root, &mut stack);
    while let Some(node) = stack.pop() {
        if let Visit::Descend = visit(node) {
            push_children(node, &mut stack);
        }
    }
}

fn push_children<'t>(node: Node<'t>, stack: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    stack.extend(children.into_iter().rev());
}

/// Extract the declared name of a node.
///
/// Tries the `name` field, then the `type` field (Rust `impl` blocks), then the
/// first identifier-like child.
fn symbol_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    let named = node
        .child_by_field_name("name")
        .or_else(|| node.child_by_field_name("type"));
    if let Some(child) = named {
        return child.utf8_text(source).ok().map(str::to_string);
    }

    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| {
        matches!(
            child.kind(),
            "identifier" | "name" | "type_identifier" | "field_identifier"
        )
    });
    found.and_then(|child| child.utf8_text(source).ok().map(str::to_string))
}
