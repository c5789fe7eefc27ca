use crate::config::SplitterConfig;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Expands command-line paths into the list of files to split
pub struct InputScanner {
    extensions: Vec<String>,
    exclude: GlobSet,
    recursive: bool,
}

impl InputScanner {
    pub fn new(config: &SplitterConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern `{pattern}`"))?;
            builder.add(glob);
        }

        Ok(Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            exclude: builder.build().context("Failed to build exclude patterns")?,
            recursive: config.recursive,
        })
    }

    /// Files named directly are kept as given, even when missing, so that
    /// reading them reports the error. Directories contribute matching files.
    pub fn collect(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = BTreeSet::new();
        for input in inputs {
            if input.is_dir() {
                files.extend(self.scan_dir(input));
            } else {
                files.insert(input.clone());
            }
        }

        log::info!("Found {} input file(s)", files.len());
        files.into_iter().collect()
    }

    /// Scan one directory (.gitignore aware, hidden entries skipped)
    fn scan_dir(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false);
        if !self.recursive {
            builder.max_depth(Some(1));
        }

        let mut files = Vec::new();
        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if !self.has_extension(path) {
                        continue;
                    }
                    let relative = path.strip_prefix(root).unwrap_or(path);
                    if self.exclude.is_match(relative) || self.exclude.is_match(path) {
                        log::debug!("Excluded {}", path.display());
                        continue;
                    }
                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }
        files
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}
