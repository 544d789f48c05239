use super::BoundaryExtractor;
use crate::boundary::{Boundary, BoundaryKind};
use crate::error::{ChunkerError, Result};
use crate::language::Language;
use crate::source::SourceUnit;
use tree_sitter::{Node, Parser};

/// Wrapper nodes whose kind and name come from the declaration they wrap
const WRAPPER_KINDS: &[&str] = &[
    "template_declaration",
    "decorated_definition",
    "type_declaration",
];

/// AST-based boundary extractor backed by a tree-sitter grammar.
///
/// A fresh [`Parser`] is created for every call, so concurrent calls never
/// share parser state.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterExtractor {
    language: Language,
}

impl TreeSitterExtractor {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    /// Map a node to a boundary kind, `None` for nodes that are not split points
    fn classify(&self, node: Node) -> Option<BoundaryKind> {
        let kind = node.kind();
        if kind.contains("comment") {
            return Some(BoundaryKind::Comment);
        }
        if WRAPPER_KINDS.contains(&kind) {
            return inner_declaration(node).and_then(|inner| self.classify(inner));
        }

        match self.language {
            Language::Rust => match kind {
                "function_item" | "closure_expression" | "macro_definition" => {
                    Some(BoundaryKind::Function)
                }
                "struct_item" | "enum_item" | "union_item" | "trait_item" | "impl_item"
                | "mod_item" => Some(BoundaryKind::Class),
                "if_expression" | "match_expression" | "for_expression" | "while_expression"
                | "loop_expression" | "unsafe_block" => Some(BoundaryKind::Block),
                _ => None,
            },
            Language::Python => match kind {
                "function_definition" | "lambda" => Some(BoundaryKind::Function),
                "class_definition" => Some(BoundaryKind::Class),
                "if_statement" | "for_statement" | "while_statement" | "try_statement"
                | "with_statement" | "match_statement" => Some(BoundaryKind::Block),
                _ => None,
            },
            Language::JavaScript | Language::TypeScript => match kind {
                "function_declaration" | "generator_function_declaration" | "method_definition"
                | "function_expression" | "arrow_function" => Some(BoundaryKind::Function),
                "class_declaration" | "abstract_class_declaration" | "interface_declaration"
                | "enum_declaration" | "internal_module" | "module" => Some(BoundaryKind::Class),
                "if_statement" | "for_statement" | "for_in_statement" | "while_statement"
                | "do_statement" | "try_statement" | "switch_statement" => Some(BoundaryKind::Block),
                _ => None,
            },
            Language::Go => match kind {
                "function_declaration" | "method_declaration" | "func_literal" => {
                    Some(BoundaryKind::Function)
                }
                "type_spec" => Some(BoundaryKind::Class),
                "if_statement" | "for_statement" | "expression_switch_statement"
                | "type_switch_statement" | "select_statement" => Some(BoundaryKind::Block),
                _ => None,
            },
            Language::C | Language::Cpp => match kind {
                "function_definition" | "lambda_expression" => Some(BoundaryKind::Function),
                "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier"
                | "namespace_definition" => Some(BoundaryKind::Class),
                "if_statement" | "for_statement" | "for_range_loop" | "while_statement"
                | "do_statement" | "switch_statement" | "try_statement"
                | "linkage_specification" | "preproc_if" | "preproc_ifdef" => {
                    Some(BoundaryKind::Block)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl BoundaryExtractor for TreeSitterExtractor {
    fn name(&self) -> &'static str {
        "tree-sitter"
    }

    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Boundary>> {
        let ts_language = self.language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ChunkerError::tree_sitter(format!("Failed to set language: {e}")))?;

        let text = unit.text();
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| ChunkerError::tree_sitter("Failed to parse source code"))?;

        let root = tree.root_node();
        let mut boundaries = Vec::new();
        // Index of the nearest enclosing boundary, per boundary
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut cursor = root.walk();
        // Boundary index of each node on the current cursor path, if it was emitted
        let mut path: Vec<Option<usize>> = Vec::new();

        'walk: loop {
            let node = cursor.node();
            let kind = if node.id() == root.id() {
                None
            } else {
                self.classify(node)
            };

            if let Some(kind) = kind {
                let depth = path.iter().flatten().count();
                let mut boundary =
                    Boundary::new(node.start_byte(), node.end_byte(), kind).at_depth(depth);
                if kind != BoundaryKind::Comment {
                    boundary.name = symbol_name(node, text);
                }
                parents.push(path.iter().rev().find_map(|emitted| *emitted));
                boundaries.push(boundary);
            }

            // Comments are leaves for chunking purposes
            if kind != Some(BoundaryKind::Comment) && cursor.goto_first_child() {
                path.push(kind.map(|_| boundaries.len() - 1));
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                path.pop();
            }
        }

        Ok(merge_comment_runs(boundaries, &parents, text))
    }
}

/// Join consecutive comment siblings separated by a single line break.
///
/// `parents[i]` is the enclosing boundary of `boundaries[i]`; comments under
/// different parents are never joined, since the run would cross a parent's end.
fn merge_comment_runs(
    boundaries: Vec<Boundary>,
    parents: &[Option<usize>],
    text: &str,
) -> Vec<Boundary> {
    let mut merged: Vec<Boundary> = Vec::with_capacity(boundaries.len());
    let mut last_parent = None;
    for (boundary, &parent) in boundaries.into_iter().zip(parents) {
        if let Some(prev) = merged.last_mut() {
            let joinable = prev.kind == BoundaryKind::Comment
                && boundary.kind == BoundaryKind::Comment
                && last_parent == parent
                && prev.end <= boundary.start
                && {
                    let gap = &text[prev.end..boundary.start];
                    gap.trim().is_empty() && gap.matches('\n').count() <= 1
                };
            if joinable {
                prev.end = boundary.end;
                continue;
            }
        }
        last_parent = parent;
        merged.push(boundary);
    }
    merged
}

/// Declaration wrapped by a template, decorator, or type declaration node
fn inner_declaration(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let inner = node
        .named_children(&mut cursor)
        .filter(|child| !child.kind().contains("comment"))
        .last();
    inner
}

/// Extract symbol name from AST node
fn symbol_name(node: Node, text: &str) -> Option<String> {
    if WRAPPER_KINDS.contains(&node.kind()) {
        return inner_declaration(node).and_then(|inner| symbol_name(inner, text));
    }

    if let Some(name) = node.child_by_field_name("name") {
        return node_text(name, text);
    }

    // C/C++ functions carry their name at the bottom of a declarator chain
    let mut current = node.child_by_field_name("declarator");
    while let Some(declarator) = current {
        match declarator.kind() {
            "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
            | "operator_name" | "type_identifier" => return node_text(declarator, text),
            _ => {
                current = declarator.child_by_field_name("declarator").or_else(|| {
                    let mut cursor = declarator.walk();
                    let first = declarator.named_children(&mut cursor).next();
                    first
                });
            }
        }
    }

    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|child| {
            matches!(
                child.kind(),
                "identifier" | "name" | "type_identifier" | "field_identifier"
            )
        })
        .and_then(|child| node_text(child, text));
    name
}

fn node_text(node: Node, text: &str) -> Option<String> {
    let raw = node.utf8_text(text.as_bytes()).ok()?;
    let first_line = raw.lines().next()?.trim();
    (!first_line.is_empty()).then(|| first_line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::validate_boundaries;

    fn extract(language: Language, path: &str, code: &str) -> Vec<Boundary> {
        let unit = SourceUnit::new(path, language.as_str(), code);
        TreeSitterExtractor::new(language).extract(&unit).unwrap()
    }

    fn named(boundaries: &[Boundary], kind: BoundaryKind) -> Vec<(String, usize)> {
        boundaries
            .iter()
            .filter(|b| b.kind == kind)
            .filter_map(|b| b.name.clone().map(|name| (name, b.depth)))
            .collect()
    }

    #[test]
    fn test_rust_boundaries() {
        let code = r#"
/// Entry point
fn main() {
    println!("Hello");
}

struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
"#;
        let boundaries = extract(Language::Rust, "test.rs", code);
        assert!(validate_boundaries(&boundaries, code.len()).is_ok());

        let functions = named(&boundaries, BoundaryKind::Function);
        assert!(functions.contains(&("main".to_string(), 0)));
        assert!(functions.contains(&("new".to_string(), 1)));

        let classes = named(&boundaries, BoundaryKind::Class);
        assert!(classes.iter().any(|(name, _)| name == "Point"));
        assert!(boundaries.iter().any(|b| b.kind == BoundaryKind::Comment));
    }

    #[test]
    fn test_python_boundaries() {
        let code = r#"
def hello():
    print("Hello")

class MyClass:
    def method(self):
        if True:
            pass
"#;
        let boundaries = extract(Language::Python, "test.py", code);
        assert!(validate_boundaries(&boundaries, code.len()).is_ok());
        let functions = named(&boundaries, BoundaryKind::Function);
        assert!(functions.contains(&("hello".to_string(), 0)));
        assert!(functions.contains(&("method".to_string(), 1)));
        assert!(boundaries
            .iter()
            .any(|b| b.kind == BoundaryKind::Block && b.depth == 2));
    }

    #[test]
    fn test_cpp_boundaries() {
        let code = r#"
// Copyright line one
// Copyright line two

namespace grpc {
class AlarmImpl : public CompletionQueueTag {
 public:
  AlarmImpl() : tag_(nullptr) {}
  bool FinalizeResult(void** tag, bool* status) override {
    *tag = tag_;
    return true;
  }
};

void Alarm::Cancel() { alarm_->Cancel(); }
}  // namespace grpc
"#;
        let boundaries = extract(Language::Cpp, "alarm.cc", code);
        assert!(validate_boundaries(&boundaries, code.len()).is_ok());

        let classes = named(&boundaries, BoundaryKind::Class);
        assert!(classes.contains(&("grpc".to_string(), 0)));
        assert!(classes.contains(&("AlarmImpl".to_string(), 1)));

        let functions = named(&boundaries, BoundaryKind::Function);
        assert!(functions.iter().any(|(name, _)| name == "FinalizeResult"));
        assert!(functions.iter().any(|(name, _)| name == "Alarm::Cancel"));

        let header = boundaries
            .iter()
            .find(|b| b.kind == BoundaryKind::Comment)
            .unwrap();
        assert!(code[header.span()].contains("line one"));
        assert!(code[header.span()].contains("line two"));
    }

    #[test]
    fn test_go_boundaries() {
        let code = "package main\n\ntype Point struct {\n\tX int\n}\n\nfunc (p Point) Len() int {\n\treturn p.X\n}\n";
        let boundaries = extract(Language::Go, "main.go", code);
        let functions = named(&boundaries, BoundaryKind::Function);
        assert!(functions.iter().any(|(name, _)| name == "Len"));
        let classes = named(&boundaries, BoundaryKind::Class);
        assert!(classes.iter().any(|(name, _)| name == "Point"));
    }

    #[test]
    fn test_merge_comment_runs_respects_blank_lines() {
        let text = "// a\n// b\n\n// c\n";
        let boundaries = vec![
            Boundary::new(0, 4, BoundaryKind::Comment),
            Boundary::new(5, 9, BoundaryKind::Comment),
            Boundary::new(11, 15, BoundaryKind::Comment),
        ];
        let merged = merge_comment_runs(boundaries, &[None, None, None], text);
        assert_eq!(
            merged,
            vec![
                Boundary::new(0, 9, BoundaryKind::Comment),
                Boundary::new(11, 15, BoundaryKind::Comment),
            ]
        );
    }

    #[test]
    fn test_merge_comment_runs_keeps_parents_apart() {
        let text = "{ // a\n// b\n   }";
        let comments = vec![
            Boundary::new(2, 6, BoundaryKind::Comment).at_depth(1),
            Boundary::new(7, 11, BoundaryKind::Comment).at_depth(1),
        ];

        let apart = merge_comment_runs(comments.clone(), &[Some(0), Some(3)], text);
        assert_eq!(apart, comments);

        let joined = merge_comment_runs(comments, &[Some(0), Some(0)], text);
        assert_eq!(joined, vec![Boundary::new(2, 11, BoundaryKind::Comment).at_depth(1)]);
    }
}
