use crate::assemble::{Assembler, RawChunk};
use crate::boundary::{Boundary, BoundaryTree};
use crate::emit::Emitter;
use crate::error::Result;
use crate::extract::ExtractorRegistry;
use crate::policy::ChunkPolicy;
use crate::source::SourceUnit;
use crate::stitch::stitch_context;
use crate::types::Chunk;
use std::io::Write;
use std::path::Path;

/// Main chunker interface for processing code
///
/// Holds only immutable configuration, so one instance can serve many
/// threads; every call builds its own parser and boundary tree.
#[derive(Debug, Clone)]
pub struct Chunker {
    policy: ChunkPolicy,
    registry: ExtractorRegistry,
}

impl Chunker {
    /// Create a new chunker with the built-in tree-sitter extractors
    pub fn new(policy: ChunkPolicy) -> Result<Self> {
        Self::with_registry(policy, ExtractorRegistry::with_tree_sitter())
    }

    /// Create a chunker with a custom extractor table
    pub fn with_registry(policy: ChunkPolicy, registry: ExtractorRegistry) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy, registry })
    }

    /// Chunk code from a string, detecting the language from `path`
    pub fn chunk_str(&self, content: &str, path: &str) -> Result<Vec<Chunk>> {
        self.chunk(&SourceUnit::from_path(path, content))
    }

    /// Chunk code with an explicit language identifier
    pub fn chunk_with_language(&self, content: &str, path: &str, language: &str) -> Result<Vec<Chunk>> {
        self.chunk(&SourceUnit::new(path, language, content))
    }

    /// Chunk code from a file
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        self.chunk(&SourceUnit::from_path(path, content))
    }

    /// Split a source unit into ordered chunks that tile its text
    pub fn chunk(&self, unit: &SourceUnit) -> Result<Vec<Chunk>> {
        let tree = self.boundary_tree(unit)?;
        let raw = Assembler::new(unit, &tree, &self.policy).assemble()?;

        let chunks: Vec<Chunk> = raw
            .into_iter()
            .map(|raw| self.finish(unit, &tree, raw))
            .collect();

        log::debug!(
            "Chunked {} ({} bytes) into {} chunks",
            unit.path(),
            unit.len(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Boundaries reported by the extractor (or fallback) for a unit
    pub fn boundaries(&self, unit: &SourceUnit) -> Result<Vec<Boundary>> {
        self.registry.extract(unit, self.policy.fallback)
    }

    /// Nesting tree the assembler walks, after repair and gap filling
    pub fn boundary_tree(&self, unit: &SourceUnit) -> Result<BoundaryTree> {
        let boundaries = self.boundaries(unit)?;
        Ok(BoundaryTree::build(unit, boundaries))
    }

    /// Chunk a unit and write its records with `emitter`
    pub fn emit<W: Write>(&self, unit: &SourceUnit, emitter: &Emitter, writer: W) -> Result<()> {
        let chunks = self.chunk(unit)?;
        emitter.write(writer, &chunks)
    }

    fn finish(&self, unit: &SourceUnit, tree: &BoundaryTree, raw: RawChunk) -> Chunk {
        let (start_line, end_line) = unit.line_span(&raw.span);
        let context = stitch_context(unit, tree, &raw.span, raw.scope, self.policy.context_lines);

        Chunk {
            path: unit.path().to_string(),
            language: unit.language_tag().to_string(),
            start_line,
            end_line,
            start_byte: raw.span.start,
            end_byte: raw.span.end,
            kind: raw.kind,
            name: raw.name,
            text: unit.slice(raw.span.clone()).to_string(),
            context,
            core_size: self.policy.measure(unit, &raw.span),
            overflow: raw.overflow,
        }
    }

    /// Get the active policy
    #[must_use]
    pub const fn policy(&self) -> &ChunkPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn stats(chunks: &[Chunk]) -> ChunkingStats {
        let sizes = || chunks.iter().map(|chunk| chunk.core_size);
        let total_size: usize = sizes().sum();

        ChunkingStats {
            total_chunks: chunks.len(),
            total_lines: chunks.iter().map(Chunk::line_count).sum(),
            total_size,
            avg_size: if chunks.is_empty() {
                0
            } else {
                total_size / chunks.len()
            },
            min_size: sizes().min().unwrap_or(0),
            max_size: sizes().max().unwrap_or(0),
            oversized: chunks.iter().filter(|chunk| chunk.is_oversized()).count(),
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            policy: ChunkPolicy::default(),
            registry: ExtractorRegistry::with_tree_sitter(),
        }
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    /// Sum of core sizes, in the policy's unit
    pub total_size: usize,
    pub avg_size: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub oversized: usize,
}

impl ChunkingStats {
    /// Fold the stats of another batch into this one
    pub fn merge(&mut self, other: &Self) {
        if other.total_chunks == 0 {
            return;
        }
        self.min_size = if self.total_chunks == 0 {
            other.min_size
        } else {
            self.min_size.min(other.min_size)
        };
        self.max_size = self.max_size.max(other.max_size);
        self.total_chunks += other.total_chunks;
        self.total_lines += other.total_lines;
        self.total_size += other.total_size;
        self.oversized += other.oversized;
        self.avg_size = self.total_size / self.total_chunks;
    }
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Size: {} | Avg: {} | Range: {}-{} | Oversized: {}",
            self.total_chunks,
            self.total_lines,
            self.total_size,
            self.avg_size,
            self.min_size,
            self.max_size,
            self.oversized
        )
    }
}
