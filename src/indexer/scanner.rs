// SPDX-License-Identifier: MIT OR Apache-2.0

//! File scanner using the ignore crate (same as ripgrep)

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::warn;

use crate::errors::SyncError;

const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Lists source files under a root, filtered by extension.
pub struct FileScanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, extensions: &[String]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Every file counts: ignore files are not consulted, hidden entries are skipped.
    fn make_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .parents(false)
            .ignore(false)
            .git_ignore(false)
            .git_exclude(false)
            .git_global(false);
        builder
    }

    fn is_wanted(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let lower = ext.to_ascii_lowercase();
                self.extensions.iter().any(|candidate| *candidate == lower)
            })
            .unwrap_or(false)
    }

    /// Matching file paths, sorted ascending by full path.
    pub fn list_files(&self) -> Result<Vec<PathBuf>, SyncError> {
        if !self.root.is_dir() {
            return Err(SyncError::Scan {
                root: self.root.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel();
        let walker = self
            .make_builder()
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !SKIPPED_DIRS.contains(&name))
                    .unwrap_or(true)
            })
            .build_parallel();

        walker.run(|| {
            let tx = tx.clone();
            Box::new(move |entry| {
                match entry {
                    Ok(entry) => {
                        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
                        if is_file && self.is_wanted(entry.path()) {
                            let _ = tx.send(entry.into_path());
                        }
                    }
                    Err(err) => warn!("Skipping unreadable entry: {}", err),
                }
                ignore::WalkState::Continue
            })
        });

        drop(tx);
        let mut files: Vec<PathBuf> = rx.into_iter().collect();
        files.sort();
        Ok(files)
    }
}

/// Stable document id: root-relative path, forward slashes, leading `/`.
pub fn document_id(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.is_empty() {
        None
    } else {
        Some(format!("/{}", rel.trim_start_matches('/')))
    }
}
