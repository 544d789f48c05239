use crate::language::Language;
use std::ops::Range;
use std::path::Path;

/// A source file loaded for chunking.
///
/// Immutable once built; the chunker only borrows it for the duration of a
/// single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    path: String,
    language_tag: String,
    language: Language,
    text: String,
    /// Byte offset of the first byte of every line
    line_starts: Vec<usize>,
}

impl SourceUnit {
    /// Create a unit with an explicit language identifier
    pub fn new(
        path: impl Into<String>,
        language_tag: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let language_tag = language_tag.into();
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();

        Self {
            path: path.into(),
            language: Language::from_tag(&language_tag),
            language_tag,
            text,
            line_starts,
        }
    }

    /// Create a unit whose language is detected from the path extension
    pub fn from_path(path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        let path = path.as_ref();
        let language = Language::from_path(path);
        Self::new(path.to_string_lossy(), language.as_str(), text)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Language identifier as supplied by the caller
    #[must_use]
    pub fn language_tag(&self) -> &str {
        &self.language_tag
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines, counting a trailing unterminated line. Empty text has one line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        if self.text.ends_with('\n') {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
        .max(1)
    }

    /// 1-based line containing the byte at `offset`
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Byte offset where the 1-based `line` starts
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts
            .get(line.saturating_sub(1))
            .copied()
            .unwrap_or(self.text.len())
    }

    /// Byte offset just past the end of the 1-based `line`, including its newline
    #[must_use]
    pub fn line_end(&self, line: usize) -> usize {
        self.line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// First and last 1-based line touched by a byte span
    #[must_use]
    pub fn line_span(&self, range: &Range<usize>) -> (usize, usize) {
        let start = self.line_of(range.start);
        if range.end <= range.start {
            return (start, start);
        }
        (start, self.line_of(range.end - 1).max(start))
    }

    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.text[range]
    }
}
