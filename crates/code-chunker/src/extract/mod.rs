//! Boundary extraction: turning source text into candidate split points.
//!
//! Every supported language provides a [`BoundaryExtractor`]; languages
//! without one fall back to a heuristic or whole-file extractor depending on
//! [`FallbackMode`].

mod heuristic;
mod syntax;

pub use heuristic::{HeuristicExtractor, WholeFileExtractor};
pub use syntax::TreeSitterExtractor;

use crate::boundary::Boundary;
use crate::error::{ChunkerError, Result};
use crate::language::Language;
use crate::policy::FallbackMode;
use crate::source::SourceUnit;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability: given a source unit, return boundaries ordered by start offset.
///
/// Implementations must not keep state between calls; each call has to be
/// reproducible on its own.
pub trait BoundaryExtractor: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Boundary>>;
}

/// Language → extractor table
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<Language, Arc<dyn BoundaryExtractor>>,
}

impl ExtractorRegistry {
    /// Registry with no language extractors; only the fallback applies
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with a tree-sitter extractor for every language that has a grammar
    #[must_use]
    pub fn with_tree_sitter() -> Self {
        let mut registry = Self::empty();
        for language in Language::ALL.into_iter().filter(|language| language.supports_ast()) {
            registry.register(language, TreeSitterExtractor::new(language));
        }
        registry
    }

    /// Register (or replace) the extractor for a language
    pub fn register(
        &mut self,
        language: Language,
        extractor: impl BoundaryExtractor + 'static,
    ) -> &mut Self {
        self.extractors.insert(language, Arc::new(extractor));
        self
    }

    #[must_use]
    pub fn get(&self, language: Language) -> Option<&dyn BoundaryExtractor> {
        self.extractors.get(&language).map(|extractor| &**extractor)
    }

    #[must_use]
    pub fn supports(&self, language: Language) -> bool {
        self.extractors.contains_key(&language)
    }

    /// Extract boundaries for a unit, applying the fallback when needed.
    ///
    /// Only fails when no extractor applies and `fallback` is
    /// [`FallbackMode::None`], or the language extractor fails without a
    /// fallback to degrade to.
    pub fn extract(&self, unit: &SourceUnit, fallback: FallbackMode) -> Result<Vec<Boundary>> {
        if let Some(extractor) = self.get(unit.language()) {
            match extractor.extract(unit) {
                Ok(boundaries) => {
                    log::debug!(
                        "{} extracted {} boundaries from {}",
                        extractor.name(),
                        boundaries.len(),
                        unit.path()
                    );
                    return Ok(boundaries);
                }
                Err(e) if fallback != FallbackMode::None => {
                    log::warn!(
                        "{} failed on {}, falling back to {fallback:?}: {e}",
                        extractor.name(),
                        unit.path()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        match fallback {
            FallbackMode::None => Err(ChunkerError::unsupported_language(unit.language_tag())),
            FallbackMode::WholeFile => WholeFileExtractor.extract(unit),
            FallbackMode::Heuristic => HeuristicExtractor.extract(unit),
        }
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.extractors
                    .iter()
                    .map(|(language, extractor)| (language.as_str(), extractor.name())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;

    struct Broken;

    impl BoundaryExtractor for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn extract(&self, _unit: &SourceUnit) -> Result<Vec<Boundary>> {
            Err(ChunkerError::tree_sitter("grammar unavailable"))
        }
    }

    #[test]
    fn unsupported_language_without_fallback_fails() {
        let registry = ExtractorRegistry::with_tree_sitter();
        let unit = SourceUnit::new("query.cob", "cobol", "DISPLAY 'HI'.");
        let err = registry.extract(&unit, FallbackMode::None).unwrap_err();
        assert!(matches!(err, ChunkerError::UnsupportedLanguage(ref lang) if lang == "cobol"));
    }

    #[test]
    fn unsupported_language_uses_whole_file_fallback() {
        let registry = ExtractorRegistry::with_tree_sitter();
        let unit = SourceUnit::new("query.cob", "cobol", "DISPLAY 'HI'.");
        let boundaries = registry.extract(&unit, FallbackMode::WholeFile).unwrap();
        assert_eq!(boundaries, vec![Boundary::new(0, unit.len(), BoundaryKind::Other)]);
    }

    #[test]
    fn failing_extractor_degrades_to_fallback() {
        let mut registry = ExtractorRegistry::empty();
        registry.register(Language::Rust, Broken);
        let unit = SourceUnit::new("lib.rs", "rust", "fn a() {}\n");

        assert!(registry.extract(&unit, FallbackMode::None).is_err());
        let boundaries = registry.extract(&unit, FallbackMode::Heuristic).unwrap();
        assert!(!boundaries.is_empty());
    }

    #[test]
    fn registry_lists_grammars() {
        let registry = ExtractorRegistry::with_tree_sitter();
        assert!(registry.supports(Language::Cpp));
        assert!(!registry.supports(Language::Java));
        for language in Language::ALL {
            assert_eq!(registry.supports(language), language.supports_ast(), "{language:?}");
        }
        assert!(format!("{registry:?}").contains("tree-sitter"));
    }
}
