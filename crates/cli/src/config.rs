use anyhow::{Context, Result};
use codesplit_chunker::{ChunkPolicy, FallbackMode, OverflowStrategy, SizeUnit};
use std::fs;
use std::path::Path;

/// Read a chunk policy from a TOML file; unset keys keep their defaults
pub(crate) fn load_policy(path: &Path) -> Result<ChunkPolicy> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let policy: ChunkPolicy = toml::from_str(&raw)
        .with_context(|| format!("Invalid policy in {}", path.display()))?;
    log::debug!("Loaded policy from {}: {policy:?}", path.display());
    Ok(policy)
}

/// Policy fields set on the command line, applied over the file or preset
#[derive(Debug, Default, Clone)]
pub(crate) struct PolicyOverrides {
    pub max_size: Option<usize>,
    pub min_size: Option<usize>,
    pub unit: Option<SizeUnit>,
    pub context_lines: Option<usize>,
    pub overflow: Option<OverflowStrategy>,
    pub fallback: Option<FallbackMode>,
}

impl PolicyOverrides {
    pub(crate) fn apply(&self, mut policy: ChunkPolicy) -> ChunkPolicy {
        if let Some(max_size) = self.max_size {
            policy.max_size = max_size;
        }
        if let Some(min_size) = self.min_size {
            policy.min_size = min_size;
        }
        if let Some(unit) = self.unit {
            policy.unit = unit;
        }
        if let Some(context_lines) = self.context_lines {
            policy.context_lines = context_lines;
        }
        if let Some(overflow) = self.overflow {
            policy.overflow = overflow;
        }
        if let Some(fallback) = self.fallback {
            policy.fallback = fallback;
        }
        policy
    }
}
