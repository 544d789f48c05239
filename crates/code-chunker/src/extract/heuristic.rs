use super::BoundaryExtractor;
use crate::boundary::{Boundary, BoundaryKind};
use crate::error::Result;
use crate::source::SourceUnit;
use regex::Regex;
use std::sync::OnceLock;

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "sizeof", "else", "do",
];

fn class_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:export|pub(?:\([^)]*\))?|public|private|protected|internal|abstract|final|sealed|data|static|default)\s+)*(?:class|struct|interface|trait|enum|impl|namespace|module|object|record)\s+([A-Za-z_][\w:.]*)",
        )
        .expect("class header regex is valid")
    })
}

fn function_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:export|pub(?:\([^)]*\))?|public|private|protected|internal|static|async|override|suspend|inline|final)\s+)*(?:fn|def|func|function|fun|sub|proc)\s+(?:\([^)]*\)\s*)?([A-Za-z_][\w]*)",
        )
        .expect("function header regex is valid")
    })
}

fn c_function_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[\w:<>,\*&]+\s+)*?[\*&]*([A-Za-z_~][\w:~]*)\s*\([^;]*$")
            .expect("C-style header regex is valid")
    })
}

/// Delimiter-based extractor for languages without a grammar.
///
/// Splits the text into blank-line separated blocks. A block made only of
/// comments becomes a `comment` boundary, a block opening with a recognisable
/// declaration becomes `function`/`class`, anything else is a `block`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    fn classify(unit: &SourceUnit, block: &str) -> (BoundaryKind, Option<String>) {
        let language = unit.language();
        let mut code_lines = block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !language.is_comment_line(line))
            .peekable();

        let Some(&header) = code_lines.peek() else {
            return (BoundaryKind::Comment, None);
        };

        if let Some(caps) = class_header().captures(header) {
            return (BoundaryKind::Class, caps.get(1).map(|m| m.as_str().to_string()));
        }
        if let Some(caps) = function_header().captures(header) {
            return (
                BoundaryKind::Function,
                caps.get(1).map(|m| m.as_str().to_string()),
            );
        }
        let first_word = header
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default();
        if CONTROL_KEYWORDS.contains(&first_word) {
            return (BoundaryKind::Block, None);
        }
        if let Some(name) = c_function_header()
            .captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !CONTROL_KEYWORDS.contains(name))
        {
            return (BoundaryKind::Function, Some(name.to_string()));
        }

        (BoundaryKind::Block, None)
    }
}

impl BoundaryExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Boundary>> {
        let text = unit.text();
        let mut boundaries = Vec::new();
        let mut block_start: Option<usize> = None;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let blank = line.trim().is_empty();
            match (block_start, blank) {
                (None, false) => block_start = Some(offset),
                (Some(start), true) => {
                    boundaries.push(Self::block(unit, start, offset));
                    block_start = None;
                }
                _ => {}
            }
            offset += line.len();
        }
        if let Some(start) = block_start {
            boundaries.push(Self::block(unit, start, text.len()));
        }

        Ok(boundaries)
    }
}

impl HeuristicExtractor {
    fn block(unit: &SourceUnit, start: usize, end: usize) -> Boundary {
        let (kind, name) = Self::classify(unit, unit.slice(start..end));
        let mut boundary = Boundary::new(start, end, kind);
        boundary.name = name;
        boundary
    }
}

/// Treats the whole file as a single `other` boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFileExtractor;

impl BoundaryExtractor for WholeFileExtractor {
    fn name(&self) -> &'static str {
        "whole-file"
    }

    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Boundary>> {
        Ok(vec![Boundary::new(0, unit.len(), BoundaryKind::Other)])
    }
}
