use anyhow::{bail, Context, Result};
use codesplit_chunker::{SkipReason, SkipStats, DEFAULT_EXCLUDED_PATTERNS};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

fn glob_set<'a>(patterns: impl IntoIterator<Item = &'a str>, what: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid {what} pattern {pattern:?}"))?;
        builder.add(glob);
    }
    builder
        .build()
        .with_context(|| format!("Failed to compile {what} patterns"))
}

/// Glob patterns deciding which walked files enter the run
pub(crate) struct PathFilters {
    exclude: GlobSet,
    /// `None` admits every path that is not excluded
    include: Option<GlobSet>,
}

impl PathFilters {
    pub(crate) fn new(use_defaults: bool, exclude: &[String], include: &[String]) -> Result<Self> {
        let defaults = DEFAULT_EXCLUDED_PATTERNS
            .iter()
            .copied()
            .filter(|_| use_defaults);
        let exclude = glob_set(defaults.chain(exclude.iter().map(String::as_str)), "exclude")?;
        let include = if include.is_empty() {
            None
        } else {
            Some(glob_set(include.iter().map(String::as_str), "include")?)
        };
        Ok(Self { exclude, include })
    }

    /// Why a path relative to the walked root is filtered out, if it is.
    /// Exclusion wins over inclusion.
    pub(crate) fn rejects(&self, relative: &Path) -> Option<SkipReason> {
        if self.exclude.is_match(relative) {
            return Some(SkipReason::Excluded);
        }
        match &self.include {
            Some(include) if !include.is_match(relative) => Some(SkipReason::NotIncluded),
            _ => None,
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Expand the command-line paths into a sorted, de-duplicated file list.
///
/// Files named explicitly are always kept. Directories are walked
/// recursively, skipping hidden entries, paths the filters reject, and files
/// that `accept` turns down.
pub(crate) fn collect_files(
    paths: &[PathBuf],
    filters: &PathFilters,
    accept: impl Fn(&Path) -> bool,
    skipped: &mut SkipStats,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            bail!("Path does not exist: {}", root.display());
        }

        for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_hidden(e)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry under {}: {err}", root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if let Some(reason) = filters.rejects(relative) {
                let size = entry.metadata().map_or(0, |meta| meta.len());
                skipped.add(reason, usize::try_from(size).unwrap_or(usize::MAX));
                log::debug!("Skipping {} ({reason})", path.display());
                continue;
            }
            if !accept(path) {
                log::debug!("No extractor for {}, skipping", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
