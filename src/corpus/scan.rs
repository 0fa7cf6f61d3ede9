//! Corpus file discovery

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::{default_include_extensions, normalize_extension};
use crate::error::{Error, Result};
use crate::utils::normalize_path;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Dot-prefixed, lowercase
    pub include_extensions: HashSet<String>,
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_extensions: default_include_extensions(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

/// A file selected for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub relative_path: String,
}

/// Recursively lists matching files under `root`, sorted by relative path so
/// id assignment is stable between runs over an unchanged tree.
pub fn scan_text_files(root: &Path, options: &ScanOptions) -> Result<Vec<CorpusFile>> {
    if !root.is_dir() {
        return Err(Error::Config(format!("input directory {} does not exist", root.display())));
    }

    let excludes = build_globset(&options.exclude_globs)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(options.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable directory entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(normalize_extension)
            .is_some_and(|ext| options.include_extensions.contains(&ext));
        if !matches_extension {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_path = normalize_path(&relative.to_string_lossy());
        if excludes.is_match(&relative_path) {
            tracing::debug!(path = %relative_path, "excluded by glob");
            continue;
        }

        files.push(CorpusFile { path: path.to_path_buf(), relative_path });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|err| Error::Config(format!("invalid exclude glob '{pattern}': {err}")))?;
        builder.add(glob);
    }
    builder.build().map_err(|err| Error::Config(format!("invalid exclude globs: {err}")))
}
