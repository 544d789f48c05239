use crate::policy::{ChunkPolicy, SizeUnit};
use crate::source::SourceUnit;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Hard-split a span into pieces of at most `max_size`, ignoring syntax.
///
/// Line budgets cut at line ends. Byte budgets cut after the last newline
/// that fits, and inside a single over-long line at the last grapheme
/// boundary that fits. Pieces tile the span exactly.
pub(crate) fn hard_split(
    unit: &SourceUnit,
    span: Range<usize>,
    policy: &ChunkPolicy,
) -> Vec<Range<usize>> {
    let max = policy.max_size.max(1);
    let mut pieces = Vec::new();
    let mut cursor = span.start;

    while cursor < span.end {
        let end = match policy.unit {
            SizeUnit::Lines => {
                let last_line = unit.line_of(cursor) + max - 1;
                unit.line_end(last_line).min(span.end)
            }
            SizeUnit::Bytes => byte_cut(unit.text(), cursor, span.end, max),
        };
        pieces.push(cursor..end);
        cursor = end;
    }

    pieces
}

fn byte_cut(text: &str, cursor: usize, limit: usize, max: usize) -> usize {
    if limit - cursor <= max {
        return limit;
    }

    let mut budget_end = cursor + max;
    while !text.is_char_boundary(budget_end) {
        budget_end -= 1;
    }
    if let Some(newline) = text[cursor..budget_end].rfind('\n') {
        return cursor + newline + 1;
    }

    let rest = &text[cursor..limit];
    let mut cut = None;
    for (offset, _) in rest.grapheme_indices(true).skip(1) {
        if offset > max {
            break;
        }
        cut = Some(offset);
    }
    cursor + cut.unwrap_or_else(|| rest.graphemes(true).next().map_or(rest.len(), str::len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces<'a>(unit: &'a SourceUnit, ranges: &[Range<usize>]) -> Vec<&'a str> {
        ranges.iter().map(|r| unit.slice(r.clone())).collect()
    }

    #[test]
    fn splits_by_lines() {
        let unit = SourceUnit::new("a.txt", "text", "1\n2\n3\n4\n5\n");
        let ranges = hard_split(&unit, 0..unit.len(), &ChunkPolicy::line_based(2));
        assert_eq!(pieces(&unit, &ranges), vec!["1\n2\n", "3\n4\n", "5\n"]);
    }

    #[test]
    fn splits_by_bytes_at_newlines() {
        let unit = SourceUnit::new("a.txt", "text", "aaa\nbbb\nccc\n");
        let policy = ChunkPolicy {
            min_size: 1,
            max_size: 9,
            ..Default::default()
        };
        let ranges = hard_split(&unit, 0..unit.len(), &policy);
        assert_eq!(pieces(&unit, &ranges), vec!["aaa\nbbb\n", "ccc\n"]);
    }

    #[test]
    fn splits_long_line_on_grapheme_boundaries() {
        let text = "ab\u{e9}\u{301}cd";
        let unit = SourceUnit::new("a.txt", "text", text);
        let policy = ChunkPolicy {
            min_size: 1,
            max_size: 4,
            ..Default::default()
        };
        let ranges = hard_split(&unit, 0..unit.len(), &policy);
        assert_eq!(ranges.iter().map(|r| r.end).last(), Some(text.len()));
        for range in &ranges {
            assert!(text.is_char_boundary(range.start));
            assert!(range.len() <= 4 || unit.slice(range.clone()).graphemes(true).count() == 1);
        }
        assert_eq!(pieces(&unit, &ranges).concat(), text);
    }

    #[test]
    fn oversized_grapheme_stays_whole() {
        let text = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        let unit = SourceUnit::new("a.txt", "text", text);
        let policy = ChunkPolicy {
            min_size: 1,
            max_size: 2,
            ..Default::default()
        };
        let ranges = hard_split(&unit, 0..unit.len(), &policy);
        assert_eq!(ranges, vec![0..text.len()]);
    }
}
