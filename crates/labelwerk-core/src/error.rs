// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Labelwerk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Labelwerk operations.
#[derive(Debug, Error)]
pub enum LabelwerkError {
    // -- Job building --
    #[error("template not found: {template} (looked for {path})")]
    TemplateNotFound { template: String, path: PathBuf },

    #[error("invalid template identifier: {0:?}")]
    InvalidTemplateId(String),

    // -- External tool --
    #[error("failed to launch external tool {executable}: {source}")]
    ToolLaunch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("external tool did not finish within {secs}s")]
    ToolTimeout { secs: u64 },

    // -- Save automation --
    #[error("save automation failed: {0}")]
    Automation(String),

    #[error("keystroke input unavailable: {0}")]
    KeyInput(String),

    // -- Verification --
    #[error("no artifact was written to {0}")]
    ArtifactMissing(PathBuf),

    #[error("artifact at {0} is empty")]
    ArtifactEmpty(PathBuf),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabelwerkError>;

/// Caller-facing classification of a failed job.
///
/// This is what a `JobResult` carries across the HTTP boundary; the full
/// `LabelwerkError` only lives in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The template could not be resolved. Nothing was launched.
    TemplateNotFound,
    /// The save sequence errored or reported failure.
    AutomationFailure,
    /// Automation reported success but no file exists at the target path.
    ArtifactMissing,
    /// Automation reported success but the file is zero bytes.
    ArtifactEmpty,
    /// The external tool executable could not be started.
    ToolLaunchFailure,
    /// Anything else.
    UnexpectedError,
}

impl FailureKind {
    /// Known, caller-explainable failures map to a client-error status;
    /// launch problems and unexpected errors are server-side.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ToolLaunchFailure | Self::UnexpectedError)
    }
}

impl LabelwerkError {
    /// Classify this error for the job result.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TemplateNotFound { .. } | Self::InvalidTemplateId(_) => {
                FailureKind::TemplateNotFound
            }
            Self::Automation(_) | Self::KeyInput(_) => FailureKind::AutomationFailure,
            Self::ArtifactMissing(_) => FailureKind::ArtifactMissing,
            Self::ArtifactEmpty(_) => FailureKind::ArtifactEmpty,
            Self::ToolLaunch { .. } => FailureKind::ToolLaunchFailure,
            Self::ToolTimeout { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Unexpected(_) => FailureKind::UnexpectedError,
        }
    }
}
