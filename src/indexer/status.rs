// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync status record: one line per top-level sub-tree of the source root,
//! `<timestamp> <name> <revision>`, replaced atomically after each run.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

use crate::errors::suggestions;

pub const STATUS_FILE_NAME: &str = "git.status";

/// Revision written when a sub-tree is not a git checkout.
pub const UNKNOWN_REVISION: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub timestamp: String,
    pub name: String,
    pub revision: String,
}

impl StatusEntry {
    fn line(&self) -> String {
        format!("{} {} {}", self.timestamp, self.name, self.revision)
    }
}

/// Entries for every visible top-level directory under `root`, sorted by name.
pub fn collect_status(root: &Path, now: DateTime<Utc>) -> Result<Vec<StatusEntry>> {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let revision = git_revision(entry.path()).unwrap_or_else(|| UNKNOWN_REVISION.to_string());
        entries.push(StatusEntry {
            timestamp: timestamp.clone(),
            name: name.to_string(),
            revision,
        });
    }

    Ok(entries)
}

/// Write the status record for `root` and return its path.
pub fn write_status(root: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let entries = collect_status(root, now)?;
    let mut content = String::new();
    for entry in &entries {
        content.push_str(&entry.line());
        content.push('\n');
    }
    let path = root.join(STATUS_FILE_NAME);
    atomic_write_bytes(&path, content.as_bytes())?;
    Ok(path)
}

/// Status record text, or a placeholder when it cannot be read.
pub fn read_status(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|_| suggestions::status_unavailable_message().to_string())
}

/// `HEAD` of the checkout at `dir`, if it is one.
pub fn git_revision(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "HEAD"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if revision.is_empty() {
        None
    } else {
        Some(revision)
    }
}

pub(crate) fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let Some(parent) = path.parent() else {
        anyhow::bail!("cannot atomically write {} without parent", path.display());
    };
    std::fs::create_dir_all(parent)?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let tmp_name = format!(
        ".{}.tmp-{}-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(STATUS_FILE_NAME),
        std::process::id(),
        nonce
    );
    let tmp_path = parent.join(tmp_name);

    {
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync {}", tmp_path.display()))?;
    }

    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("failed to move {} into place", path.display()));
    }

    Ok(())
}
