// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable failure messages for operators at the label station.
//
// Every failure kind is mapped to plain English with a clear suggestion.
// The technical error string travels alongside in `JobResult::error`.

use crate::error::FailureKind;

/// A human-readable failure with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the operator should try (shown as body text).
    pub suggestion: String,
    /// Whether resubmitting the same job is likely to help.
    pub retriable: bool,
}

/// Convert a `FailureKind` into a `HumanError` an operator can act on.
pub fn humanize_failure(kind: FailureKind, template: &str) -> HumanError {
    match kind {
        FailureKind::TemplateNotFound => HumanError {
            message: format!("The label template \"{template}\" doesn't exist."),
            suggestion: "Check the template name, or ask an administrator to install the template \
                file."
                .into(),
            retriable: false,
        },

        FailureKind::AutomationFailure => HumanError {
            message: "The label designer's save dialog couldn't be completed.".into(),
            suggestion: "Make sure nobody is using the print station's keyboard or mouse, \
                then submit the job again."
                .into(),
            retriable: true,
        },

        FailureKind::ArtifactMissing => HumanError {
            message: "The label was printed but no file was saved.".into(),
            suggestion: "The save dialog may have needed more time. Submit the job again; if this \
                keeps happening, raise the dialog delays."
                .into(),
            retriable: true,
        },

        FailureKind::ArtifactEmpty => HumanError {
            message: "The saved label file is empty.".into(),
            suggestion: "The file may still have been writing when it was checked. Submit the job \
                again; if this keeps happening, raise the flush delay."
                .into(),
            retriable: true,
        },

        FailureKind::ToolLaunchFailure => HumanError {
            message: "The label designer couldn't be started.".into(),
            suggestion: "Check that the label designer is installed and that the configured \
                executable path is correct."
                .into(),
            retriable: false,
        },

        FailureKind::UnexpectedError => HumanError {
            message: "The print service had an internal problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it with the job id."
                .into(),
            retriable: true,
        },
    }
}
