// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result verification: did the job actually leave a usable artifact?

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use labelwerk_core::error::{LabelwerkError, Result};

/// An artifact that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtifact {
    /// Absolute path of the artifact.
    pub path: PathBuf,
    pub size: u64,
}

/// What is at the target path right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Missing,
    Empty,
    Present(u64),
}

/// Check the saved artifact against the automation's own report.
///
/// Success needs both: the automation said it saved, and a non-empty file
/// is at `target`. A zero-byte file is never reported as valid; it is left
/// in place either way.
#[instrument(skip_all, fields(target = %target.display(), automation_ok = automation_ok))]
pub fn verify_artifact(target: &Path, automation_ok: bool) -> Result<VerifiedArtifact> {
    let state = file_state(target);
    debug!(?state, "artifact state");

    if !automation_ok {
        let found = match state {
            Ok(FileState::Missing) => "no file was written".to_string(),
            Ok(FileState::Empty) => "an empty file was left behind".to_string(),
            Ok(FileState::Present(size)) => {
                format!("a {size}-byte file exists but is not trusted")
            }
            Err(e) => format!("the target could not be inspected ({e})"),
        };
        return Err(LabelwerkError::Automation(format!(
            "save sequence reported failure; {found} at {}",
            target.display()
        )));
    }

    match state? {
        FileState::Missing => Err(LabelwerkError::ArtifactMissing(target.to_path_buf())),
        FileState::Empty => Err(LabelwerkError::ArtifactEmpty(target.to_path_buf())),
        FileState::Present(size) => Ok(VerifiedArtifact {
            path: std::path::absolute(target)?,
            size,
        }),
    }
}

fn file_state(target: &Path) -> Result<FileState> {
    match std::fs::metadata(target) {
        Ok(meta) if !meta.is_file() => Ok(FileState::Missing),
        Ok(meta) if meta.len() == 0 => Ok(FileState::Empty),
        Ok(meta) => Ok(FileState::Present(meta.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileState::Missing),
        Err(e) => Err(e.into()),
    }
}
