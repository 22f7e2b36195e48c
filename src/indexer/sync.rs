// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change-detection sync of a source tree into the engine.
//!
//! Files are listed in full-path order and streamed in fixed-size batches.
//! Each batch is read in parallel, checked against the stored fingerprints
//! and only the changed documents are submitted. A failing batch stops the
//! run; earlier batches stay submitted.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{StoreError, SyncError};
use crate::indexer::scanner::{document_id, FileScanner};
use crate::store::{Document, Engine, StoreClient};

/// Counters for one indexing batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// 1-based batch number.
    pub batch: usize,
    pub read: usize,
    pub unchanged: usize,
    pub submitted: usize,
    pub read_ms: u64,
    pub save_ms: u64,
}

/// Outcome of syncing one root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub root: String,
    pub batches: usize,
    pub scanned: usize,
    pub unchanged: usize,
    pub submitted: usize,
    pub elapsed_ms: u64,
}

impl SyncReport {
    fn absorb(&mut self, batch: &BatchReport) {
        self.batches += 1;
        self.scanned += batch.read;
        self.unchanged += batch.unchanged;
        self.submitted += batch.submitted;
    }
}

/// Drives change-detection syncs through a store client.
pub struct Indexer<'a, E> {
    client: &'a StoreClient<E>,
    extensions: Vec<String>,
    read_batch_size: usize,
    overwrite: bool,
}

impl<'a, E: Engine> Indexer<'a, E> {
    pub fn new(client: &'a StoreClient<E>, config: &Config) -> Self {
        Self {
            client,
            extensions: config.extensions.clone(),
            read_batch_size: config.read_batch_size.max(1),
            overwrite: config.overwrite,
        }
    }

    pub fn with_read_batch_size(mut self, size: usize) -> Self {
        self.read_batch_size = size.max(1);
        self
    }

    /// Submit every document, skipping the existence check.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Scan `root` and sync every matching file.
    pub fn sync_root(&self, root: &Path) -> Result<SyncReport, SyncError> {
        let files = FileScanner::new(root, &self.extensions).list_files()?;
        info!(root = %root.display(), files = files.len(), "indexing");
        self.sync_files(root, &files)
    }

    /// Sync an explicit file list; ids are derived relative to `root`.
    pub fn sync_files(&self, root: &Path, files: &[PathBuf]) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let stamp = chrono::Utc::now().timestamp();
        let mut report = SyncReport {
            root: root.display().to_string(),
            ..SyncReport::default()
        };

        for (index, chunk) in files.chunks(self.read_batch_size).enumerate() {
            let batch = index + 1;
            let read_started = Instant::now();
            let documents = chunk
                .par_iter()
                .map(|path| read_document(root, path, stamp))
                .collect::<Result<Vec<_>, SyncError>>()?;
            let read_ms = elapsed_ms(read_started);

            let save_started = Instant::now();
            let read = documents.len();
            let (unchanged, submitted) =
                self.sync_batch(documents).map_err(|source| SyncError::Batch {
                    batch,
                    submitted_batches: report.batches,
                    source,
                })?;
            let batch_report = BatchReport {
                batch,
                read,
                unchanged,
                submitted,
                read_ms,
                save_ms: elapsed_ms(save_started),
            };
            info!(
                batch,
                documents = read,
                read_ms = batch_report.read_ms,
                save_ms = batch_report.save_ms,
                changed = submitted,
                "batch synced"
            );
            report.absorb(&batch_report);
        }

        report.elapsed_ms = elapsed_ms(started);
        info!(
            root = %report.root,
            batches = report.batches,
            scanned = report.scanned,
            submitted = report.submitted,
            unchanged = report.unchanged,
            "sync finished"
        );
        Ok(report)
    }

    /// Returns `(unchanged, submitted)` counts.
    fn sync_batch(&self, documents: Vec<Document>) -> Result<(usize, usize), StoreError> {
        let total = documents.len();
        let changed = if self.overwrite {
            documents
        } else {
            let pairs: Vec<(String, String)> = documents
                .iter()
                .map(|doc| (doc.id.clone(), doc.fingerprint.clone()))
                .collect();
            let existing = self.client.check_existing(&pairs)?;
            documents
                .into_iter()
                .filter(|doc| !existing.contains(&doc.id))
                .collect()
        };
        let unchanged = total - changed.len();
        debug!(total, unchanged, "change detection");
        let submitted = self.client.submit(changed)?;
        Ok((unchanged, submitted.len()))
    }
}

fn read_document(root: &Path, path: &Path, stamp: i64) -> Result<Document, SyncError> {
    let bytes = std::fs::read(path).map_err(|source| SyncError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let id = document_id(root, path).unwrap_or_else(|| path.display().to_string());
    Ok(Document::from_bytes(id, &bytes, stamp))
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
