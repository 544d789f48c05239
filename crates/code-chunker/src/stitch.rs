use crate::boundary::{BoundaryKind, BoundaryTree};
use crate::source::SourceUnit;
use std::ops::Range;

/// Build the header text of the scopes enclosing a chunk.
///
/// `scope` is the innermost tree node the chunk sits in. Every enclosing
/// class or function that starts on an earlier line contributes its
/// declaration line, outermost first; the innermost one may add the
/// non-blank header lines that follow it while the budget lasts. Nothing is
/// taken from the chunk's own lines.
pub(crate) fn stitch_context(
    unit: &SourceUnit,
    tree: &BoundaryTree,
    span: &Range<usize>,
    scope: Option<usize>,
    context_lines: usize,
) -> Option<String> {
    let scope = scope?;
    if context_lines == 0 {
        return None;
    }

    let chunk_line = unit.line_of(span.start);
    let mut chain: Vec<usize> = std::iter::once(scope)
        .chain(tree.ancestors(scope))
        .filter(|&idx| {
            let boundary = &tree.node(idx).boundary;
            boundary.kind.is_scope() && unit.line_of(boundary.start) < chunk_line
        })
        .take(context_lines)
        .collect();

    let innermost = *chain.first()?;
    chain.reverse();

    let mut lines: Vec<usize> = Vec::with_capacity(context_lines);
    for &idx in &chain {
        let line = unit.line_of(tree.node(idx).boundary.start);
        if lines.last().map_or(true, |&last| line > last) {
            lines.push(line);
        }
    }

    let node = tree.node(innermost);
    let header_end = node
        .children
        .iter()
        .map(|&child| &tree.node(child).boundary)
        .find(|child| child.kind != BoundaryKind::Other)
        .map_or(chunk_line, |child| unit.line_of(child.start).min(chunk_line));
    let first_extra = lines.last().map_or(chunk_line, |&last| last + 1);
    let budget = context_lines - lines.len();
    lines.extend(
        (first_extra..header_end)
            .filter(|&line| !unit.slice(unit.line_start(line)..unit.line_end(line)).trim().is_empty())
            .take(budget),
    );

    let mut context = String::new();
    for line in lines {
        context.push_str(unit.slice(unit.line_start(line)..unit.line_end(line)));
        if !context.ends_with('\n') {
            context.push('\n');
        }
    }

    (!context.is_empty()).then_some(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "class Outer {\n  int a;\n  void f() {\n    step();\n    step();\n  }\n};\n";

    fn fixture() -> (SourceUnit, BoundaryTree, usize, usize) {
        let unit = SourceUnit::new("outer.cpp", "cpp", SOURCE);
        let f_start = SOURCE.find("  void").unwrap();
        let f_end = SOURCE.find("  }\n").unwrap() + 4;
        let tree = BoundaryTree::build(
            &unit,
            vec![
                Boundary::new(0, SOURCE.len(), BoundaryKind::Class).with_name("Outer"),
                Boundary::new(f_start, f_end, BoundaryKind::Function).with_name("f"),
            ],
        );
        let find = |kind| {
            tree.walk()
                .into_iter()
                .find(|&idx| tree.node(idx).boundary.kind == kind)
                .unwrap()
        };
        let (class, function) = (find(BoundaryKind::Class), find(BoundaryKind::Function));
        (unit, tree, class, function)
    }

    #[test]
    fn declaration_line_of_enclosing_class() {
        let (unit, tree, class, function) = fixture();
        let span = tree.node(function).boundary.span();
        assert_eq!(
            stitch_context(&unit, &tree, &span, Some(class), 1).as_deref(),
            Some("class Outer {\n")
        );
    }

    #[test]
    fn innermost_scope_adds_header_lines() {
        let (unit, tree, class, function) = fixture();
        let span = tree.node(function).boundary.span();
        assert_eq!(
            stitch_context(&unit, &tree, &span, Some(class), 5).as_deref(),
            Some("class Outer {\n  int a;\n")
        );
    }

    #[test]
    fn nested_scopes_are_listed_outermost_first() {
        let (unit, tree, _, function) = fixture();
        let body = unit.line_start(4)..unit.line_end(5);

        assert_eq!(
            stitch_context(&unit, &tree, &body, Some(function), 2).as_deref(),
            Some("class Outer {\n  void f() {\n")
        );
        assert_eq!(
            stitch_context(&unit, &tree, &body, Some(function), 1).as_deref(),
            Some("  void f() {\n")
        );
    }

    #[test]
    fn no_context_for_chunk_starting_at_scope() {
        let (unit, tree, class, function) = fixture();
        let whole = 0..unit.len();
        assert_eq!(stitch_context(&unit, &tree, &whole, Some(class), 3), None);
        let span = tree.node(function).boundary.span();
        assert_eq!(stitch_context(&unit, &tree, &span, Some(class), 0), None);
        assert_eq!(stitch_context(&unit, &tree, &span, None, 3), None);
    }
}
