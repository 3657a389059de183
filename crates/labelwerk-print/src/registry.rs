// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only view over the output directory.
//
// Nothing is cached: every call re-reads the directory, so the filesystem
// stays the single source of truth for what has been printed.

use std::cmp::Reverse;
use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use labelwerk_core::config::ServiceConfig;
use labelwerk_core::types::{ArtifactMetadata, download_url};

/// Lists and looks up saved artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    root: PathBuf,
    extension: String,
    download_base: String,
}

impl ArtifactRegistry {
    pub fn new(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        download_base: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            download_base: download_base.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.output_dir.clone(),
            config.artifact_extension.clone(),
            config.download_base.clone(),
        )
    }

    /// All artifacts, most recently created first.
    ///
    /// Never fails: an unreadable directory gives an empty list and files
    /// that cannot be stat'ed are left out.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn list(&self) -> Vec<ArtifactMetadata> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "cannot read output directory");
                return Vec::new();
            }
        };

        let mut artifacts: Vec<ArtifactMetadata> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|path| self.has_artifact_extension(path))
            .filter_map(|path| self.describe(&path))
            .collect();

        artifacts.sort_by_key(|a| Reverse((a.created_at, a.filename.clone())));
        debug!(count = artifacts.len(), "artifacts listed");
        artifacts
    }

    /// Metadata for one artifact, or `None` when there is no such artifact.
    ///
    /// Names that would leave the output directory are never found.
    pub fn get(&self, filename: &str) -> Option<ArtifactMetadata> {
        if !is_plain_filename(filename) {
            debug!(%filename, "rejected artifact name");
            return None;
        }
        let path = self.root.join(filename);
        if !self.has_artifact_extension(&path) {
            return None;
        }
        self.describe(&path)
    }

    fn has_artifact_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Stat `path` into metadata; `None` (with a warning) if it is not a
    /// readable regular file.
    fn describe(&self, path: &Path) -> Option<ArtifactMetadata> {
        let filename = path.file_name()?.to_str()?.to_string();
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat artifact, skipping");
                return None;
            }
        };
        if !meta.is_file() {
            return None;
        }

        let (created_at, modified_at) = match timestamps(&meta) {
            Ok(times) => times,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "artifact has no usable timestamps, skipping"
                );
                return None;
            }
        };

        Some(ArtifactMetadata {
            download_url: download_url(&self.download_base, &filename),
            file_path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            size_bytes: meta.len(),
            created_at,
            modified_at,
            filename,
        })
    }
}

/// Creation and modification time. Platforms without a birth time report
/// the modification time for both.
fn timestamps(meta: &Metadata) -> std::io::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let modified = meta.modified()?;
    let created = meta.created().unwrap_or(modified);
    Ok((DateTime::from(created), DateTime::from(modified)))
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
