// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print service — the job lifecycle from request to verified artifact.
//
//   Building ──► Launching ──► Verifying ──► Succeeded
//       │            │             │
//       └────────────┴─────────────┴──────► Failed
//
// During Launching the external tool runs as a child process while the save
// automation drives its dialog; the tool is only waited on (with a ceiling)
// once the automation has finished.  Every failure is folded into a
// `JobResult` at this boundary; nothing escapes to the caller as an error.
//
// The Launching phase runs on its own task holding the tool lock.  Dropping
// a `submit` future (client gone, request timeout) abandons the result but
// never the phase: keystrokes, tool wait and script cleanup still finish
// before the next job may start.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use labelwerk_core::config::ServiceConfig;
use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::{
    ArtifactMetadata, JobId, JobRequest, JobResult, JobState, download_url,
};

use crate::registry::ArtifactRegistry;
use crate::script::{JobPlan, resolve_template};
use crate::sequence::SaveAutomation;
use crate::supervisor::{ToolSupervisor, discard_script};
use crate::verify::{VerifiedArtifact, verify_artifact};

/// Orchestrates print jobs against one external tool instance.
///
/// Construct one per tool instance. Jobs are serialized internally: the
/// save automation types into whatever window has focus, so two jobs must
/// never be in their Launching phase at the same time.
pub struct PrintService<A> {
    config: ServiceConfig,
    supervisor: ToolSupervisor,
    registry: ArtifactRegistry,
    automation: Arc<A>,
    tool_lock: Arc<Mutex<()>>,
}

/// Per-job progress: current state plus diagnostics gathered so far.
struct JobRun {
    state: JobState,
    notes: Vec<String>,
}

impl JobRun {
    fn new() -> Self {
        Self {
            state: JobState::Building,
            notes: Vec::new(),
        }
    }

    fn advance(&mut self, next: JobState) {
        debug!(from = ?self.state, to = ?next, "job state");
        self.state = next;
    }
}

/// Everything the Launching phase needs, owned so it can outlive the caller.
struct LaunchPhase<A> {
    supervisor: ToolSupervisor,
    automation: Arc<A>,
    tool_timeout: Duration,
    script: String,
    target: PathBuf,
}

impl<A: SaveAutomation> LaunchPhase<A> {
    /// Write the script, start the tool, drive the save dialog, wait out the
    /// tool, delete the script. `_guard` is released only after all of it.
    async fn run(self, _guard: OwnedMutexGuard<()>) -> (Result<bool>, Vec<String>) {
        let script = match self.supervisor.write_script(&self.script) {
            Ok(script) => script,
            Err(e) => return (Err(e), Vec::new()),
        };

        let mut notes = Vec::new();
        let saved = match self.supervisor.launch(&script) {
            Ok(tool) => {
                let saved = self.automation.attempt_save(&self.target).await;
                let outcome = tool.wait(self.tool_timeout).await;
                debug!(
                    saved,
                    timed_out = outcome.timed_out(),
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "launch phase finished"
                );
                notes.extend(outcome.notes());
                Ok(saved)
            }
            Err(e) => Err(e),
        };

        discard_script(script);
        (saved, notes)
    }
}

impl<A: SaveAutomation> PrintService<A> {
    /// Validate `config` and create the output, templates, and scratch
    /// directories if they are missing.
    pub fn new(config: ServiceConfig, automation: A) -> Result<Self> {
        config.validate()?;
        for dir in [
            config.output_dir.clone(),
            config.templates_dir.clone(),
            config.scratch_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }

        info!(
            templates = %config.templates_dir.display(),
            output = %config.output_dir.display(),
            tool = %config.tool_executable.display(),
            "print service ready"
        );

        Ok(Self {
            supervisor: ToolSupervisor::from_config(&config),
            registry: ArtifactRegistry::from_config(&config),
            config,
            automation: Arc::new(automation),
            tool_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Run one job to a terminal state.
    pub async fn submit(&self, request: JobRequest) -> JobResult {
        let job_id = JobId::new();
        let span = info_span!(
            "print_job",
            %job_id,
            template = %request.template,
            requester = %request.requester
        );

        async {
            info!(fields = request.data.len(), "print job received");
            let mut run = JobRun::new();

            match self.run(&request, &mut run).await {
                Ok((plan, artifact)) => {
                    run.advance(JobState::Succeeded);
                    info!(
                        filename = %plan.filename,
                        bytes = artifact.size,
                        "print job succeeded"
                    );
                    let url = download_url(&self.config.download_base, &plan.filename);
                    JobResult::succeeded(
                        job_id,
                        plan.filename,
                        artifact.path,
                        artifact.size,
                        url,
                        run.notes,
                    )
                }
                Err(err) => {
                    run.advance(JobState::Failed);
                    let kind = err.kind();
                    if kind.is_client_error() {
                        warn!(?kind, error = %err, "print job failed");
                    } else {
                        error!(?kind, error = %err, "print job failed");
                    }
                    JobResult::failed(job_id, &request.template, &err, run.notes)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// All saved artifacts, newest first.
    pub fn list_artifacts(&self) -> Vec<ArtifactMetadata> {
        self.registry.list()
    }

    /// One artifact's metadata, or `None` if it does not exist.
    pub fn artifact_status(&self, filename: &str) -> Option<ArtifactMetadata> {
        self.registry.get(filename)
    }

    /// Worst-case duration of one job once it holds the tool lock.
    pub fn job_budget(&self) -> Duration {
        self.config.job_budget()
    }

    async fn run(
        &self,
        request: &JobRequest,
        run: &mut JobRun,
    ) -> Result<(JobPlan, VerifiedArtifact)> {
        // A bad template fails here without waiting for the tool.
        resolve_template(&self.config, &request.template)?;

        let guard = Arc::clone(&self.tool_lock).lock_owned().await;
        // The collision check for the output name must see the previous
        // job's artifact, so the plan is built under the lock.
        let plan = JobPlan::build(&self.config, request, Local::now().naive_local())?;

        run.advance(JobState::Launching);
        let phase = LaunchPhase {
            supervisor: self.supervisor.clone(),
            automation: Arc::clone(&self.automation),
            tool_timeout: self.config.tool_timeout(),
            script: plan.script.clone(),
            target: plan.output_path.clone(),
        };
        let launch = tokio::spawn(phase.run(guard).instrument(Span::current()));
        let (saved, notes) = launch
            .await
            .map_err(|e| LabelwerkError::Unexpected(format!("launch phase aborted: {e}")))?;
        run.notes.extend(notes);
        let saved = saved?;

        run.advance(JobState::Verifying);
        let artifact = verify_artifact(&plan.output_path, saved)?;
        Ok((plan, artifact))
    }
}
