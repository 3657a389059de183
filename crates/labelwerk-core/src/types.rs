// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Labelwerk print service.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FailureKind, LabelwerkError};
use crate::human_errors::humanize_failure;

/// Requester recorded when a submission names nobody.
pub const DEFAULT_REQUESTER: &str = "system";

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to render one label through the external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Template identifier, without directory or extension.
    pub template: String,
    /// Named values substituted into the template.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Who asked for the label; becomes the first filename segment.
    #[serde(default = "default_requester")]
    pub requester: String,
    /// Replaces the `{requester}_{template}` filename stem when set.
    #[serde(default)]
    pub output_name: Option<String>,
}

fn default_requester() -> String {
    DEFAULT_REQUESTER.to_string()
}

impl JobRequest {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            data: BTreeMap::new(),
            requester: default_requester(),
            output_name: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = requester.into();
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Lifecycle states of a single job. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Resolving the template and rendering the job script.
    Building,
    /// External tool and save sequence running side by side.
    Launching,
    /// Checking the artifact on disk.
    Verifying,
    Succeeded,
    Failed,
}

/// Outcome of one submission. Built fresh per job and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Technical failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    /// Operator-facing advice for a failed job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Whether resubmitting the same job is likely to help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retriable: Option<bool>,
    /// Template the failed job was built from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Non-fatal observations from the run (timeouts, exit status, stderr).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl JobResult {
    pub fn succeeded(
        job_id: JobId,
        filename: String,
        file_path: PathBuf,
        file_size: u64,
        download_url: String,
        notes: Vec<String>,
    ) -> Self {
        Self {
            job_id,
            success: true,
            message: "print job completed".into(),
            filename: Some(filename),
            file_path: Some(file_path),
            file_size: Some(file_size),
            download_url: Some(download_url),
            error: None,
            error_kind: None,
            suggestion: None,
            retriable: None,
            template: None,
            notes,
        }
    }

    pub fn failed(job_id: JobId, template: &str, err: &LabelwerkError, notes: Vec<String>) -> Self {
        let kind = err.kind();
        let human = humanize_failure(kind, template);
        Self {
            job_id,
            success: false,
            message: human.message,
            filename: None,
            file_path: None,
            file_size: None,
            download_url: None,
            error: Some(err.to_string()),
            error_kind: Some(kind),
            suggestion: Some(human.suggestion),
            retriable: Some(human.retriable),
            template: Some(template.to_string()),
            notes,
        }
    }
}

/// Live view of one saved artifact, rebuilt from `stat` on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub filename: String,
    pub file_path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub download_url: String,
}

/// Join a download base and a filename without doubling the slash.
pub fn download_url(base: &str, filename: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), filename)
}
