use crate::boundary::BoundaryKind;
use crate::error::{ChunkerError, Result};
use crate::source::SourceUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// Configuration for code chunking behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChunkPolicy {
    /// Chunks smaller than this are merged into a neighbour (unless alone)
    pub min_size: usize,

    /// Maximum core size of a chunk; stitched context does not count
    pub max_size: usize,

    /// Unit both size limits are measured in
    pub unit: SizeUnit,

    /// Number of enclosing-scope header lines to prepend, 0 disables stitching
    pub context_lines: usize,

    /// Boundary kinds that are only split as a last resort
    pub atomic_kinds: BTreeSet<BoundaryKind>,

    /// What to do with an atomic boundary larger than `max_size`
    pub overflow: OverflowStrategy,

    /// Extractor used when the language has no grammar
    pub fallback: FallbackMode,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            min_size: 32,
            max_size: 2048,
            unit: SizeUnit::Bytes,
            context_lines: 0,
            atomic_kinds: BTreeSet::from([BoundaryKind::Function, BoundaryKind::Class]),
            overflow: OverflowStrategy::SplitNested,
            fallback: FallbackMode::Heuristic,
        }
    }
}

impl ChunkPolicy {
    /// Create policy optimized for embeddings (smaller, focused chunks)
    pub fn for_embeddings() -> Self {
        Self {
            max_size: 1536,
            context_lines: 2,
            ..Default::default()
        }
    }

    /// Create policy optimized for LLM context (larger, comprehensive chunks)
    pub fn for_llm_context() -> Self {
        Self {
            min_size: 256,
            max_size: 8192,
            context_lines: 3,
            ..Default::default()
        }
    }

    /// Create a line-budgeted policy
    pub fn line_based(max_lines: usize) -> Self {
        Self {
            min_size: 1,
            max_size: max_lines,
            unit: SizeUnit::Lines,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(ChunkerError::policy("max_size must be > 0"));
        }

        if self.min_size > self.max_size {
            return Err(ChunkerError::policy(format!(
                "min_size ({}) cannot exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn is_atomic(&self, kind: BoundaryKind) -> bool {
        self.atomic_kinds.contains(&kind)
    }

    /// Size of a byte span in the configured unit
    #[must_use]
    pub fn measure(&self, unit: &SourceUnit, range: &Range<usize>) -> usize {
        if range.end <= range.start {
            return 0;
        }
        match self.unit {
            SizeUnit::Bytes => range.end - range.start,
            SizeUnit::Lines => {
                let (first, last) = unit.line_span(range);
                last - first + 1
            }
        }
    }

    /// Whether a byte span fits within `max_size`
    #[must_use]
    pub fn fits(&self, unit: &SourceUnit, range: &Range<usize>) -> bool {
        self.measure(unit, range) <= self.max_size
    }
}

/// Unit of measure for chunk sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeUnit {
    Lines,
    #[default]
    Bytes,
}

/// Handling of atomic boundaries that exceed `max_size` on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowStrategy {
    /// Emit the boundary whole as a flagged oversized chunk
    PreserveAtomic,

    /// Split at nested boundaries, hard-splitting only when none are left
    #[default]
    SplitNested,

    /// Split at line (or grapheme) boundaries, ignoring structure
    ForceSplit,

    /// Fail the call with a policy violation
    Reject,
}

/// Extractor used for languages without a registered grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackMode {
    /// Fail with `UnsupportedLanguage`
    None,

    /// One boundary spanning the whole file
    WholeFile,

    /// Blank-line separated blocks with declaration detection
    #[default]
    Heuristic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_valid() {
        let policy = ChunkPolicy::default();
        assert!(policy.validate().is_ok());
        assert!(policy.is_atomic(BoundaryKind::Function));
        assert!(policy.is_atomic(BoundaryKind::Class));
        assert!(!policy.is_atomic(BoundaryKind::Block));
        assert_eq!(policy.overflow, OverflowStrategy::SplitNested);
    }

    #[test]
    fn test_preset_policies_valid() {
        assert!(ChunkPolicy::for_embeddings().validate().is_ok());
        assert!(ChunkPolicy::for_llm_context().validate().is_ok());
        assert!(ChunkPolicy::line_based(50).validate().is_ok());
    }

    #[test]
    fn test_policy_validation() {
        let mut policy = ChunkPolicy {
            min_size: 100,
            max_size: 50,
            ..Default::default()
        };
        let err = policy.validate().unwrap_err();
        assert!(matches!(err, ChunkerError::PolicyViolation(_)));

        policy.max_size = 0;
        policy.min_size = 0;
        assert!(policy.validate().is_err());

        policy.max_size = 100;
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_measure_units() {
        let unit = SourceUnit::new("a.txt", "text", "one\ntwo\nthree\n");
        let bytes = ChunkPolicy::default();
        let lines = ChunkPolicy::line_based(2);

        assert_eq!(bytes.measure(&unit, &(0..8)), 8);
        assert_eq!(lines.measure(&unit, &(0..8)), 2);
        assert_eq!(lines.measure(&unit, &(0..9)), 3);
        assert_eq!(lines.measure(&unit, &(4..4)), 0);
        assert!(lines.fits(&unit, &(0..8)));
        assert!(!lines.fits(&unit, &(0..14)));
    }

    #[test]
    fn test_policy_deserializes_partial_config() {
        let policy: ChunkPolicy = serde_json::from_str(
            r#"{"max-size": 40, "unit": "lines", "overflow": "preserve-atomic", "atomic-kinds": ["function"]}"#,
        )
        .unwrap();
        assert_eq!(policy.max_size, 40);
        assert_eq!(policy.unit, SizeUnit::Lines);
        assert_eq!(policy.overflow, OverflowStrategy::PreserveAtomic);
        assert!(!policy.is_atomic(BoundaryKind::Class));
        assert_eq!(policy.min_size, ChunkPolicy::default().min_size);
    }
}
