use codesplit_chunker::{ChunkingStats, SkipStats};

/// Human-readable run summary, written to stderr so stdout stays JSON
pub(crate) fn render_summary(files: usize, chunks: &ChunkingStats, skipped: &SkipStats) -> String {
    let mut out = format!("Files: {files} | {chunks}");
    if !skipped.is_empty() {
        out.push('\n');
        out.push_str(&skipped.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesplit_chunker::SkipReason;

    #[test]
    fn summary_lists_skips_only_when_present() {
        let stats = ChunkingStats {
            total_chunks: 3,
            total_lines: 30,
            total_size: 600,
            avg_size: 200,
            min_size: 100,
            max_size: 300,
            oversized: 1,
        };
        let clean = render_summary(2, &stats, &SkipStats::default());
        assert_eq!(
            clean,
            "Files: 2 | Chunks: 3 | Lines: 30 | Size: 600 | Avg: 200 | Range: 100-300 | Oversized: 1"
        );

        let mut skipped = SkipStats::default();
        skipped.add(SkipReason::Autogenerated, 42);
        let with_skips = render_summary(2, &stats, &skipped);
        assert!(with_skips.ends_with("\nSkipped: 1 | autogenerated: 1 (42 bytes)"));
    }
}
