//! # Codesplit Chunker
//!
//! Structure-aware splitting of source files into bounded chunks for
//! embedding and retrieval pipelines.
//!
//! ## Guarantees
//!
//! The chunker produces code fragments that:
//! - Tile the file: concatenating every chunk's core text gives back the input
//! - Respect a size budget in bytes or lines, unless a chunk is flagged oversized
//! - Break at syntactic boundaries (functions, classes, blocks, comment runs)
//! - Optionally carry enclosing-scope headers as separate context text
//!
//! ## Architecture
//!
//! ```text
//! SourceUnit (path, language tag, text)
//!     │
//!     ├──> Boundary Extractor
//!     │    ├─> tree-sitter grammar (Rust, Python, JS/TS, Go, C/C++)
//!     │    └─> fallback: heuristic blocks or whole file
//!     │
//!     ├──> Boundary Tree (nesting repair, line snapping, gap filling)
//!     │
//!     ├──> Chunk Assembler (+ ChunkPolicy)
//!     │    ├─> accumulate siblings up to max_size
//!     │    ├─> overflow: preserve-atomic / split-nested / force-split / reject
//!     │    └─> merge chunks below min_size
//!     │
//!     ├──> Context Stitcher (enclosing scope headers)
//!     │
//!     └──> Chunk Emitter → ChunkRecord[] as JSON or JSON Lines
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codesplit_chunker::{ChunkPolicy, Chunker};
//!
//! let chunker = Chunker::new(ChunkPolicy::line_based(40)).unwrap();
//!
//! let code = r#"
//! fn process_data(input: &str) -> String {
//!     input.trim().to_uppercase()
//! }
//! "#;
//!
//! let chunks = chunker.chunk_str(code, "example.rs").unwrap();
//! assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), code);
//! for chunk in chunks {
//!     println!("Chunk at lines {}-{}: {}",
//!              chunk.start_line, chunk.end_line, chunk.name.unwrap_or_default());
//! }
//! ```

mod assemble;
mod boundary;
mod chunker;
mod embeddable;
mod emit;
mod error;
pub mod extract;
mod language;
mod policy;
mod source;
mod split;
mod stitch;
mod types;

pub use boundary::{validate_boundaries, Boundary, BoundaryKind, BoundaryNode, BoundaryTree};
pub use chunker::{Chunker, ChunkingStats};
pub use embeddable::{
    check_embeddable, SkipReason, SkipStats, DEFAULT_EXCLUDED_PATTERNS, MAX_LINE_LENGTH,
    MIN_EMBEDDABLE_FILE_SIZE,
};
pub use emit::{ChunkRecord, Emitter, OutputFormat};
pub use error::{ChunkerError, Result};
pub use extract::{BoundaryExtractor, ExtractorRegistry};
pub use language::Language;
pub use policy::{ChunkPolicy, FallbackMode, OverflowStrategy, SizeUnit};
pub use source::SourceUnit;
pub use types::{Chunk, OverflowReason};
