use crate::boundary::BoundaryKind;
use serde::{Deserialize, Serialize};

/// A contiguous piece of a source file with metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Source file path
    pub path: String,

    /// Language identifier of the source unit
    pub language: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Start byte offset in the source (inclusive)
    pub start_byte: usize,

    /// End byte offset in the source (exclusive)
    pub end_byte: usize,

    /// Dominant boundary kind of the chunk
    pub kind: BoundaryKind,

    /// Symbol name (function name, class name, etc.)
    pub name: Option<String>,

    /// Exact source text of the chunk, without context
    pub text: String,

    /// Enclosing-scope header lines stitched in front of the chunk
    pub context: Option<String>,

    /// Size of `text` in the policy's unit
    pub core_size: usize,

    /// Set when the chunk deliberately exceeds `max_size`
    pub overflow: Option<OverflowReason>,
}

impl Chunk {
    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    #[must_use]
    pub const fn is_oversized(&self) -> bool {
        self.overflow.is_some()
    }

    /// Context followed by the core text
    #[must_use]
    pub fn full_text(&self) -> String {
        match &self.context {
            Some(context) => format!("{context}{}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Why a chunk exceeds the size budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowReason {
    /// Atomic boundary kept whole under `preserve-atomic`
    AtomicPreserved,
    /// Undersized chunk merged into a neighbour without room to spare
    UndersizedMerge,
    /// A single grapheme larger than the byte budget
    Indivisible,
}
