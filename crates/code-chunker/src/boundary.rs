use crate::error::{ChunkerError, Result};
use crate::source::SourceUnit;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::ops::Range;

/// Syntactic category of a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// Function, method, or lambda-like definition
    Function,
    /// Class, struct, enum, interface, impl, or namespace
    Class,
    /// Any other delimited block of statements
    Block,
    /// Comment or doc-comment run
    Comment,
    /// Prose, whitespace, or unclassified code
    Other,
}

impl BoundaryKind {
    /// Get priority for keeping a span intact (higher = more important)
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Class => 90,
            Self::Function => 80,
            Self::Block => 50,
            Self::Comment => 20,
            Self::Other => 10,
        }
    }

    /// Whether enclosing boundaries of this kind make useful context headers
    #[must_use]
    pub const fn is_scope(self) -> bool {
        matches!(self, Self::Class | Self::Function)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Block => "block",
            Self::Comment => "comment",
            Self::Other => "other",
        }
    }
}

/// A candidate split point: a byte span with a syntactic kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    pub kind: BoundaryKind,
    /// Nesting depth, 0 for top-level boundaries
    pub depth: usize,
    /// Symbol name (function name, class name, etc.)
    pub name: Option<String>,
}

impl Boundary {
    #[must_use]
    pub const fn new(start: usize, end: usize, kind: BoundaryKind) -> Self {
        Self {
            start,
            end,
            kind,
            depth: 0,
            name: None,
        }
    }

    /// Builder: set symbol name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set nesting depth
    #[must_use]
    pub const fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub const fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if `other` lies entirely within this boundary
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Check the boundary list an extractor produced.
///
/// Boundaries must be ordered by start offset, lie within `[0, len)` and
/// either nest or be disjoint. The first offending boundary is reported.
pub fn validate_boundaries(boundaries: &[Boundary], len: usize) -> Result<()> {
    let mut open: Vec<&Boundary> = Vec::new();
    let mut prev_start = 0;

    for boundary in boundaries {
        let malformed = ChunkerError::MalformedBoundaries {
            start: boundary.start,
            end: boundary.end,
        };
        if boundary.start > boundary.end || boundary.end > len || boundary.start < prev_start {
            return Err(malformed);
        }
        prev_start = boundary.start;

        while open.last().is_some_and(|top| top.end <= boundary.start) {
            open.pop();
        }
        if let Some(top) = open.last() {
            if !top.contains(boundary) && !boundary.contains(top) {
                return Err(malformed);
            }
        }
        open.push(boundary);
    }

    Ok(())
}

/// A boundary placed in the nesting tree
#[derive(Debug, Clone)]
pub struct BoundaryNode {
    pub boundary: Boundary,
    pub parent: Option<usize>,
    /// Children ordered by start offset; after gap filling they tile the node
    pub children: Vec<usize>,
}

/// Arena tree of boundaries, rebuilt on every chunking call.
///
/// Children of every node (and the top level) tile their container without
/// gaps: uncovered stretches become `Other` nodes. Spans are snapped to whole
/// lines when only whitespace separates them from the line edges.
#[derive(Debug, Clone, Default)]
pub struct BoundaryTree {
    nodes: Vec<BoundaryNode>,
    roots: Vec<usize>,
}

impl BoundaryTree {
    /// Build the tree, discarding boundaries that break the nesting invariant
    pub fn build(unit: &SourceUnit, boundaries: Vec<Boundary>) -> Self {
        let text = unit.text();
        let len = text.len();

        let mut accepted: Vec<Boundary> = boundaries
            .into_iter()
            .filter(|b| {
                let in_range = b.start <= b.end
                    && b.end <= len
                    && text.is_char_boundary(b.start)
                    && text.is_char_boundary(b.end);
                if !in_range {
                    log::warn!(
                        "Discarding out-of-range boundary {}..{} in {}",
                        b.start,
                        b.end,
                        unit.path()
                    );
                }
                in_range && !b.is_empty()
            })
            .collect();

        // Outermost first when spans start together; identical spans keep the stronger kind.
        accepted.sort_by_key(|b| (b.start, Reverse(b.end), Reverse(b.kind.priority())));
        accepted.dedup_by(|later, kept| {
            if later.span() != kept.span() {
                return false;
            }
            if kept.name.is_none() {
                kept.name = later.name.take();
            }
            true
        });

        let mut tree = Self::default();
        let mut open: Vec<usize> = Vec::new();
        for boundary in accepted {
            while open
                .last()
                .is_some_and(|&top| tree.nodes[top].boundary.end <= boundary.start)
            {
                open.pop();
            }
            let parent = open.last().copied();
            if let Some(parent) = parent {
                if boundary.end > tree.nodes[parent].boundary.end {
                    let err = ChunkerError::MalformedBoundaries {
                        start: boundary.start,
                        end: boundary.end,
                    };
                    log::warn!("{err} in {}; keeping enclosing boundary", unit.path());
                    continue;
                }
            }
            let idx = tree.push(boundary, parent);
            tree.attach(idx);
            open.push(idx);
        }

        tree.snap_to_lines(unit);
        tree.fill_gaps(len);
        tree
    }

    #[must_use]
    pub fn node(&self, idx: usize) -> &BoundaryNode {
        &self.nodes[idx]
    }

    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Strict ancestors of a node, innermost first
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[idx].parent, move |&p| self.nodes[p].parent)
    }

    /// Node indices in depth-first pre-order
    #[must_use]
    pub fn walk(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev());
        }
        order
    }

    /// Boundaries in depth-first pre-order, i.e. ordered by start offset
    #[must_use]
    pub fn boundaries(&self) -> Vec<Boundary> {
        self.walk()
            .into_iter()
            .map(|idx| self.nodes[idx].boundary.clone())
            .collect()
    }

    fn push(&mut self, mut boundary: Boundary, parent: Option<usize>) -> usize {
        boundary.depth = parent.map_or(0, |p| self.nodes[p].boundary.depth + 1);
        self.nodes.push(BoundaryNode {
            boundary,
            parent,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn attach(&mut self, idx: usize) {
        match self.nodes[idx].parent {
            Some(parent) => self.nodes[parent].children.push(idx),
            None => self.roots.push(idx),
        }
    }

    /// Widen spans to whole lines where only whitespace lies beside them.
    ///
    /// Nodes are visited in start order, parent first, so the clamp sees the
    /// parent's final span and the previous sibling's snapped end. A span never
    /// grows past the original start of its next sibling.
    fn snap_to_lines(&mut self, unit: &SourceUnit) {
        let text = unit.text();
        let mut neighbours: Vec<(Option<usize>, Option<usize>)> =
            vec![(None, None); self.nodes.len()];
        let sibling_lists = self.nodes.iter().map(|node| &node.children);
        for siblings in std::iter::once(&self.roots).chain(sibling_lists) {
            for pair in siblings.windows(2) {
                neighbours[pair[0]].1 = Some(pair[1]);
                neighbours[pair[1]].0 = Some(pair[0]);
            }
        }

        for idx in 0..self.nodes.len() {
            let container = self.nodes[idx]
                .parent
                .map_or(0..text.len(), |p| self.nodes[p].boundary.span());
            let (prev, next) = neighbours[idx];
            let floor = prev.map_or(container.start, |p| {
                self.nodes[p].boundary.end.max(container.start)
            });
            let ceiling = next.map_or(container.end, |n| {
                self.nodes[n].boundary.start.min(container.end)
            });
            let Boundary { start, end, .. } = self.nodes[idx].boundary;

            let line_start = unit.line_start(unit.line_of(start));
            let start = if text[line_start..start].trim().is_empty() {
                line_start
            } else {
                start
            };

            let line_end = unit.line_end(unit.line_of(end - 1));
            let end = if text[end..line_end.max(end)].trim().is_empty() {
                line_end.max(end)
            } else {
                end
            };

            let node = &mut self.nodes[idx].boundary;
            node.start = start.max(floor);
            node.end = end.min(ceiling);
        }
    }

    fn fill_gaps(&mut self, len: usize) {
        let containers: Vec<Option<usize>> = std::iter::once(None)
            .chain(
                (0..self.nodes.len())
                    .filter(|&idx| !self.nodes[idx].children.is_empty())
                    .map(Some),
            )
            .collect();

        for container in containers {
            let (span, kids) = match container {
                None => (0..len, std::mem::take(&mut self.roots)),
                Some(p) => (
                    self.nodes[p].boundary.span(),
                    std::mem::take(&mut self.nodes[p].children),
                ),
            };

            let mut filled = Vec::with_capacity(kids.len() * 2 + 1);
            let mut cursor = span.start;
            for kid in kids {
                let start = self.nodes[kid].boundary.start;
                if start > cursor {
                    filled.push(self.push(Boundary::new(cursor, start, BoundaryKind::Other), container));
                }
                cursor = self.nodes[kid].boundary.end;
                filled.push(kid);
            }
            if cursor < span.end {
                filled.push(self.push(Boundary::new(cursor, span.end, BoundaryKind::Other), container));
            }

            match container {
                None => self.roots = filled,
                Some(p) => self.nodes[p].children = filled,
            }
        }
    }
}
