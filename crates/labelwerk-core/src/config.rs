// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LabelwerkError, Result};

/// Pauses of the save-dialog keystroke sequence, in milliseconds.
///
/// The sequence has no feedback channel, so these are tuned per station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayProfile {
    /// Wait for the save dialog to surface before typing.
    pub dialog_settle_ms: u64,
    /// Pause after typing the path, before the first confirm.
    pub keystroke_settle_ms: u64,
    /// Pause between the two confirms.
    pub confirm_settle_ms: u64,
    /// Wait for the tool to flush the file after the second confirm.
    pub flush_ms: u64,
}

impl DelayProfile {
    /// All pauses zero (tests).
    pub fn immediate() -> Self {
        Self {
            dialog_settle_ms: 0,
            keystroke_settle_ms: 0,
            confirm_settle_ms: 0,
            flush_ms: 0,
        }
    }

    pub fn dialog_settle(&self) -> Duration {
        Duration::from_millis(self.dialog_settle_ms)
    }

    pub fn keystroke_settle(&self) -> Duration {
        Duration::from_millis(self.keystroke_settle_ms)
    }

    pub fn confirm_settle(&self) -> Duration {
        Duration::from_millis(self.confirm_settle_ms)
    }

    pub fn flush(&self) -> Duration {
        Duration::from_millis(self.flush_ms)
    }

    /// Length of one full save sequence.
    pub fn total(&self) -> Duration {
        self.dialog_settle() + self.keystroke_settle() + self.confirm_settle() + self.flush()
    }
}

impl Default for DelayProfile {
    fn default() -> Self {
        Self {
            dialog_settle_ms: 4_000,
            keystroke_settle_ms: 500,
            confirm_settle_ms: 500,
            flush_ms: 3_000,
        }
    }
}

/// Everything the print service needs, injected at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to the external label tool executable.
    pub tool_executable: PathBuf,
    /// Arguments placed before the script argument.
    pub tool_args: Vec<String>,
    /// Directory holding `{template}.{template_extension}` files.
    pub templates_dir: PathBuf,
    /// Directory the rendered artifacts are saved to.
    pub output_dir: PathBuf,
    /// Where temporary job scripts are written. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub template_extension: String,
    pub artifact_extension: String,
    /// Ceiling on the external tool's run time, in seconds.
    pub tool_timeout_secs: u64,
    pub delays: DelayProfile,
    /// URL prefix artifacts are downloadable under.
    pub download_base: String,
    pub default_requester: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tool_executable: PathBuf::from(
                r"C:\Program Files\Seagull\BarTender Suite\bartend.exe",
            ),
            tool_args: Vec::new(),
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("print_output"),
            scratch_dir: None,
            template_extension: "btw".into(),
            artifact_extension: "pdf".into(),
            tool_timeout_secs: 10,
            delays: DelayProfile::default(),
            download_base: "/api/v1/files".into(),
            default_requester: crate::types::DEFAULT_REQUESTER.into(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `LABELWERK_*` environment variables, falling
    /// back to the defaults for anything unset.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `LABELWERK_TOOL_EXE`             | BarTender install path  |
    /// | `LABELWERK_TOOL_ARGS`            | (none)                  |
    /// | `LABELWERK_TEMPLATES_DIR`        | `templates`             |
    /// | `LABELWERK_OUTPUT_DIR`           | `print_output`          |
    /// | `LABELWERK_SCRATCH_DIR`          | system temp dir         |
    /// | `LABELWERK_TEMPLATE_EXT`         | `btw`                   |
    /// | `LABELWERK_ARTIFACT_EXT`         | `pdf`                   |
    /// | `LABELWERK_TOOL_TIMEOUT_SECS`    | `10`                    |
    /// | `LABELWERK_DIALOG_SETTLE_MS`     | `4000`                  |
    /// | `LABELWERK_KEYSTROKE_SETTLE_MS`  | `500`                   |
    /// | `LABELWERK_CONFIRM_SETTLE_MS`    | `500`                   |
    /// | `LABELWERK_FLUSH_MS`             | `3000`                  |
    /// | `LABELWERK_DOWNLOAD_BASE`        | `/api/v1/files`         |
    /// | `LABELWERK_DEFAULT_REQUESTER`    | `system`                |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let tool_args = lookup("LABELWERK_TOOL_ARGS")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.tool_args);

        let delays = DelayProfile {
            dialog_settle_ms: parsed(
                &lookup,
                "LABELWERK_DIALOG_SETTLE_MS",
                defaults.delays.dialog_settle_ms,
            )?,
            keystroke_settle_ms: parsed(
                &lookup,
                "LABELWERK_KEYSTROKE_SETTLE_MS",
                defaults.delays.keystroke_settle_ms,
            )?,
            confirm_settle_ms: parsed(
                &lookup,
                "LABELWERK_CONFIRM_SETTLE_MS",
                defaults.delays.confirm_settle_ms,
            )?,
            flush_ms: parsed(&lookup, "LABELWERK_FLUSH_MS", defaults.delays.flush_ms)?,
        };

        let config = Self {
            tool_executable: path("LABELWERK_TOOL_EXE", defaults.tool_executable),
            tool_args,
            templates_dir: path("LABELWERK_TEMPLATES_DIR", defaults.templates_dir),
            output_dir: path("LABELWERK_OUTPUT_DIR", defaults.output_dir),
            scratch_dir: lookup("LABELWERK_SCRATCH_DIR").map(PathBuf::from),
            template_extension: text("LABELWERK_TEMPLATE_EXT", defaults.template_extension),
            artifact_extension: text("LABELWERK_ARTIFACT_EXT", defaults.artifact_extension),
            tool_timeout_secs: parsed(
                &lookup,
                "LABELWERK_TOOL_TIMEOUT_SECS",
                defaults.tool_timeout_secs,
            )?,
            delays,
            download_base: text("LABELWERK_DOWNLOAD_BASE", defaults.download_base),
            default_requester: text("LABELWERK_DEFAULT_REQUESTER", defaults.default_requester),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every job fail in a confusing way.
    pub fn validate(&self) -> Result<()> {
        for (name, ext) in [
            ("template extension", &self.template_extension),
            ("artifact extension", &self.artifact_extension),
        ] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(LabelwerkError::Config(format!(
                    "{name} must be a bare extension, got {ext:?}"
                )));
            }
        }
        if self.tool_timeout_secs == 0 {
            return Err(LabelwerkError::Config(
                "tool timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Upper bound on one job's Launching phase: the full save sequence
    /// followed by the longest tool wait.
    pub fn job_budget(&self) -> Duration {
        self.delays.total() + self.tool_timeout()
    }

    /// Directory for temporary job scripts.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| LabelwerkError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ServiceConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config.tool_timeout_secs, 10);
        assert_eq!(config.delays, DelayProfile::default());
        assert_eq!(config.artifact_extension, "pdf");
        assert_eq!(config.default_requester, "system");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("LABELWERK_OUTPUT_DIR", "/srv/labels"),
            ("LABELWERK_TOOL_ARGS", "/MIN /NOSPLASH"),
            ("LABELWERK_FLUSH_MS", "5000"),
            ("LABELWERK_TOOL_TIMEOUT_SECS", " 30 "),
        ]))
        .expect("valid overrides");
        assert_eq!(config.output_dir, PathBuf::from("/srv/labels"));
        assert_eq!(config.tool_args, vec!["/MIN", "/NOSPLASH"]);
        assert_eq!(config.delays.flush(), Duration::from_secs(5));
        assert_eq!(config.tool_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn unparsable_number_is_a_config_error() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("LABELWERK_FLUSH_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, LabelwerkError::Config(msg) if msg.contains("LABELWERK_FLUSH_MS")));
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("LABELWERK_ARTIFACT_EXT", ".pdf")]))
            .unwrap_err();
        assert!(matches!(err, LabelwerkError::Config(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ServiceConfig {
            tool_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn job_budget_covers_sequence_and_tool_wait() {
        let config = ServiceConfig::default();
        // 4 s settle + 0.5 s + 0.5 s + 3 s flush, then 10 s for the tool.
        assert_eq!(config.delays.total(), Duration::from_secs(8));
        assert_eq!(config.job_budget(), Duration::from_secs(18));
    }
}
