use crate::boundary::{BoundaryKind, BoundaryTree};
use crate::error::{ChunkerError, Result};
use crate::policy::{ChunkPolicy, OverflowStrategy};
use crate::source::SourceUnit;
use crate::split::hard_split;
use crate::types::OverflowReason;
use std::ops::Range;

/// A chunk before context stitching: a byte span plus what it is made of
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawChunk {
    pub span: Range<usize>,
    pub kind: BoundaryKind,
    pub name: Option<String>,
    /// Innermost node whose header may serve as context
    pub scope: Option<usize>,
    pub overflow: Option<OverflowReason>,
    /// Byte length of the unit that determined `kind`
    weight: usize,
}

impl RawChunk {
    fn empty() -> Self {
        Self {
            span: 0..0,
            kind: BoundaryKind::Other,
            name: None,
            scope: None,
            overflow: None,
            weight: 0,
        }
    }

    /// Rank used to pick the dominant unit: real boundaries beat gaps, then size
    fn rank(&self) -> (bool, usize) {
        (self.kind != BoundaryKind::Other, self.weight)
    }

    /// Extend with the chunk that follows, keeping the dominant metadata
    fn absorb(&mut self, next: Self) {
        self.span.end = next.span.end;
        if next.rank() > self.rank() {
            self.kind = next.kind;
            self.name = next.name;
            self.scope = next.scope;
            self.weight = next.weight;
        }
        self.overflow = self.overflow.or(next.overflow);
    }
}

enum Step {
    Visit(usize),
    /// Leaving a node that was split at its children
    Close,
}

/// Walks the boundary tree and packs nodes into chunks under a size policy.
pub(crate) struct Assembler<'a> {
    unit: &'a SourceUnit,
    tree: &'a BoundaryTree,
    policy: &'a ChunkPolicy,
    out: Vec<RawChunk>,
    pending: Option<RawChunk>,
}

impl<'a> Assembler<'a> {
    pub fn new(unit: &'a SourceUnit, tree: &'a BoundaryTree, policy: &'a ChunkPolicy) -> Self {
        Self {
            unit,
            tree,
            policy,
            out: Vec::new(),
            pending: None,
        }
    }

    /// Produce ordered, gap-free chunks covering the whole source
    pub fn assemble(mut self) -> Result<Vec<RawChunk>> {
        let tree = self.tree;
        let mut stack: Vec<Step> = tree.roots().iter().rev().map(|&idx| Step::Visit(idx)).collect();

        while let Some(step) = stack.pop() {
            let idx = match step {
                Step::Visit(idx) => idx,
                Step::Close => {
                    self.flush();
                    continue;
                }
            };

            let node = tree.node(idx);
            let span = node.boundary.span();
            let candidate = self.single(idx);

            if let Some(pending) = self.pending.as_mut() {
                if self.policy.fits(self.unit, &(pending.span.start..span.end)) {
                    pending.absorb(candidate);
                    continue;
                }
            }

            self.flush();
            if self.policy.fits(self.unit, &span) {
                self.pending = Some(candidate);
                continue;
            }

            let kind = node.boundary.kind;
            let strategy = if self.policy.is_atomic(kind) {
                self.policy.overflow
            } else {
                OverflowStrategy::SplitNested
            };

            match strategy {
                OverflowStrategy::PreserveAtomic => {
                    log::debug!(
                        "Keeping oversized {} {:?} in {} whole",
                        kind.as_str(),
                        node.boundary.name,
                        self.unit.path()
                    );
                    self.out.push(RawChunk {
                        overflow: Some(OverflowReason::AtomicPreserved),
                        ..candidate
                    });
                }
                OverflowStrategy::Reject => {
                    let (first, last) = self.unit.line_span(&span);
                    return Err(ChunkerError::policy(format!(
                        "{} boundary at lines {first}-{last} of {} has size {} exceeding max_size {}",
                        kind.as_str(),
                        self.unit.path(),
                        self.policy.measure(self.unit, &span),
                        self.policy.max_size
                    )));
                }
                OverflowStrategy::SplitNested if !node.children.is_empty() => {
                    stack.push(Step::Close);
                    stack.extend(node.children.iter().rev().map(|&child| Step::Visit(child)));
                }
                OverflowStrategy::SplitNested | OverflowStrategy::ForceSplit => {
                    self.force_split(idx);
                }
            }
        }

        self.flush();
        if self.out.is_empty() {
            self.out.push(RawChunk::empty());
        }

        Ok(self.merge_undersized())
    }

    /// Chunk holding exactly one node
    fn single(&self, idx: usize) -> RawChunk {
        let boundary = &self.tree.node(idx).boundary;
        RawChunk {
            span: boundary.span(),
            kind: boundary.kind,
            name: boundary.name.clone(),
            scope: self.tree.node(idx).parent,
            overflow: None,
            weight: boundary.len(),
        }
    }

    fn force_split(&mut self, idx: usize) {
        let tree = self.tree;
        let boundary = &tree.node(idx).boundary;
        let pieces = hard_split(self.unit, boundary.span(), self.policy);
        log::debug!(
            "Hard-split {} {:?} in {} into {} pieces",
            boundary.kind.as_str(),
            boundary.name,
            self.unit.path(),
            pieces.len()
        );

        for piece in pieces {
            let overflow = (!self.policy.fits(self.unit, &piece)).then_some(OverflowReason::Indivisible);
            self.out.push(RawChunk {
                weight: piece.len(),
                span: piece,
                kind: boundary.kind,
                name: boundary.name.clone(),
                scope: Some(idx),
                overflow,
            });
        }
    }

    fn flush(&mut self) {
        if let Some(chunk) = self.pending.take() {
            self.out.push(chunk);
        }
    }

    /// Fold chunks below `min_size` into a neighbour, preferring one with room
    fn merge_undersized(self) -> Vec<RawChunk> {
        let Self {
            unit,
            policy,
            out: mut chunks,
            ..
        } = self;

        if policy.min_size == 0 {
            return chunks;
        }

        let mut idx = 0;
        while idx < chunks.len() && chunks.len() > 1 {
            if policy.measure(unit, &chunks[idx].span) >= policy.min_size {
                idx += 1;
                continue;
            }

            let fits_prev =
                idx > 0 && policy.fits(unit, &(chunks[idx - 1].span.start..chunks[idx].span.end));
            let fits_next = idx + 1 < chunks.len()
                && policy.fits(unit, &(chunks[idx].span.start..chunks[idx + 1].span.end));

            let target = if fits_prev || (idx > 0 && !fits_next) {
                let small = chunks.remove(idx);
                idx -= 1;
                chunks[idx].absorb(small);
                idx
            } else {
                let next = chunks.remove(idx + 1);
                chunks[idx].absorb(next);
                idx
            };

            let merged = &mut chunks[target];
            if merged.overflow.is_none() && !policy.fits(unit, &merged.span) {
                merged.overflow = Some(OverflowReason::UndersizedMerge);
            }
            // A chunk that absorbed its successor may still be too small; look again.
        }

        chunks
    }
}
