use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Files with fewer non-whitespace-trimmed bytes carry too little signal
pub const MIN_EMBEDDABLE_FILE_SIZE: usize = 32;

/// Longest line (in bytes) an embeddable file may contain
pub const MAX_LINE_LENGTH: usize = 2048;

/// Lowercased markers that flag generated files when found in the header
const AUTOGENERATED_MARKERS: &[&str] = &[
    "autogenerated file",
    "lockfile",
    "generated by",
    "do not edit",
];

/// Number of leading lines searched for generated-file markers
const HEADER_LINES: usize = 5;

/// Paths that are rarely worth chunking, as glob patterns over relative paths
pub const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    "**/.*ignore",
    "**/.gitattributes",
    "**/.mailmap",
    "**/*.csv",
    "**/*.sql",
    "**/*.svg",
    "**/*.json",
    "**/*.jsonc",
    "**/*.jsonl",
    "**/*.xml",
    "**/*.yml",
    "**/*.yaml",
    "**/__fixtures__/**",
    "**/node_modules/**",
    "**/testdata/**",
    "**/mocks/**",
    "**/vendor/**",
];

/// Why a file was left out of chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Contains NUL bytes or is not valid UTF-8
    Binary,
    /// Too little content to be useful
    Small,
    /// Larger than the caller's size cap
    Large,
    /// Header says the file is generated
    Autogenerated,
    /// Has a line longer than [`MAX_LINE_LENGTH`]
    LongLine,
    /// Matched an exclusion pattern
    Excluded,
    /// Include patterns were given and none matched
    NotIncluded,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Small => "small",
            Self::Large => "large",
            Self::Autogenerated => "autogenerated",
            Self::LongLine => "long_line",
            Self::Excluded => "excluded",
            Self::NotIncluded => "not_included",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether raw file content is worth chunking for embeddings.
///
/// Returns the decoded text, or the first reason that disqualifies it.
pub fn check_embeddable(content: &[u8]) -> Result<&str, SkipReason> {
    if content.contains(&0) {
        return Err(SkipReason::Binary);
    }
    let text = std::str::from_utf8(content).map_err(|_| SkipReason::Binary)?;

    if text.trim().len() < MIN_EMBEDDABLE_FILE_SIZE {
        return Err(SkipReason::Small);
    }

    let header = text
        .split('\n')
        .take(HEADER_LINES)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    if AUTOGENERATED_MARKERS.iter().any(|marker| header.contains(marker)) {
        return Err(SkipReason::Autogenerated);
    }

    if text.split('\n').any(|line| line.len() > MAX_LINE_LENGTH) {
        return Err(SkipReason::LongLine);
    }

    Ok(text)
}

/// Per-reason tallies of skipped files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    counts: BTreeMap<SkipReason, usize>,
    bytes: BTreeMap<SkipReason, usize>,
}

impl SkipStats {
    pub fn add(&mut self, reason: SkipReason, byte_count: usize) {
        *self.counts.entry(reason).or_default() += 1;
        *self.bytes.entry(reason).or_default() += byte_count;
    }

    /// Fold another tally into this one
    pub fn merge(&mut self, other: &Self) {
        for (&reason, &count) in &other.counts {
            *self.counts.entry(reason).or_default() += count;
        }
        for (&reason, &bytes) in &other.bytes {
            *self.bytes.entry(reason).or_default() += bytes;
        }
    }

    #[must_use]
    pub fn count(&self, reason: SkipReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn byte_count(&self, reason: SkipReason) -> usize {
        self.bytes.get(&reason).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts keyed by reason name
    #[must_use]
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.counts.iter().map(|(r, &n)| (r.as_str(), n)).collect()
    }

    /// Byte totals keyed by reason name
    #[must_use]
    pub fn byte_counts(&self) -> BTreeMap<&'static str, usize> {
        self.bytes.iter().map(|(r, &n)| (r.as_str(), n)).collect()
    }
}

impl fmt::Display for SkipStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Skipped: {}", self.total())?;
        for (reason, count) in &self.counts {
            write!(f, " | {reason}: {count} ({} bytes)", self.byte_count(*reason))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BODY: &str = "int Alarm::Next(int value) {\n  return value + 1;\n}\n";

    #[test]
    fn accepts_ordinary_source() {
        assert_eq!(check_embeddable(BODY.as_bytes()), Ok(BODY));
    }

    #[test]
    fn rejects_binary_content() {
        assert_eq!(check_embeddable(b"\x7fELF\0\0\0 plus padding to pass the size check"), Err(SkipReason::Binary));
        assert_eq!(check_embeddable(&[0xff, 0xfe, 0xfd]), Err(SkipReason::Binary));
    }

    #[test]
    fn rejects_small_content() {
        assert_eq!(check_embeddable(b"   int x = 1;   \n\n"), Err(SkipReason::Small));
    }

    #[test]
    fn rejects_generated_header_only_near_top() {
        let generated = format!("// Code generated by protoc. DO NOT EDIT.\n{BODY}");
        assert_eq!(check_embeddable(generated.as_bytes()), Err(SkipReason::Autogenerated));

        let late = format!("\n\n\n\n\n// generated by hand\n{BODY}");
        assert!(check_embeddable(late.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_long_lines() {
        let long = format!("{BODY}// {}\n", "x".repeat(MAX_LINE_LENGTH));
        assert_eq!(check_embeddable(long.as_bytes()), Err(SkipReason::LongLine));
    }

    #[test]
    fn stats_accumulate_per_reason() {
        let mut stats = SkipStats::default();
        stats.add(SkipReason::Small, 10);
        stats.add(SkipReason::Small, 5);
        stats.add(SkipReason::LongLine, 4000);

        let mut other = SkipStats::default();
        other.add(SkipReason::Binary, 7);
        stats.merge(&other);

        assert_eq!(stats.count(SkipReason::Small), 2);
        assert_eq!(stats.byte_count(SkipReason::Small), 15);
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.counts().get("long_line"), Some(&1));
        assert_eq!(stats.byte_counts().get("binary"), Some(&7));
        assert_eq!(
            stats.to_string(),
            "Skipped: 4 | binary: 1 (7 bytes) | small: 2 (15 bytes) | long_line: 1 (4000 bytes)"
        );
    }

    #[test]
    fn path_filter_reasons_use_snake_case() {
        assert_eq!(SkipReason::NotIncluded.to_string(), "not_included");
        assert_eq!(
            serde_json::to_string(&SkipReason::NotIncluded).unwrap(),
            "\"not_included\""
        );

        let mut stats = SkipStats::default();
        stats.add(SkipReason::Excluded, 3);
        stats.add(SkipReason::NotIncluded, 9);
        assert_eq!(stats.counts().get("not_included"), Some(&1));
        assert!(stats.to_string().ends_with("excluded: 1 (3 bytes) | not_included: 1 (9 bytes)"));
    }
}
