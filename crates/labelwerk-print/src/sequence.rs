// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Save-dialog automation.
//
// The label designer offers no programmatic "save as" on this integration
// path: printing to the PDF printer raises a file dialog that has to be
// completed by hand.  `TimedSaveSequence` does that blind, on a fixed
// schedule:
//
//   settle  ->  type path  ->  pause  ->  Enter  ->  pause  ->  Enter  ->  flush
//
// The first Enter accepts the typed path, the second accepts the
// overwrite/format prompt that follows.  There is no way to observe the
// dialog, so every pause comes from the `DelayProfile`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use labelwerk_bridge::KeyInputSource;
use labelwerk_core::config::DelayProfile;
use labelwerk_core::error::{LabelwerkError, Result};

/// Strategy that gets the external tool to save its output to `target`.
///
/// Implementations never fail outward: any problem is logged and reported
/// as `false`.
pub trait SaveAutomation: Send + Sync + 'static {
    fn attempt_save(&self, target: &Path) -> impl Future<Output = bool> + Send;
}

/// The blind keystroke sequence, driven through a `KeyInputSource`.
pub struct TimedSaveSequence<S> {
    keys: Arc<S>,
    delays: DelayProfile,
}

impl<S: KeyInputSource + 'static> TimedSaveSequence<S> {
    pub fn new(keys: S, delays: DelayProfile) -> Self {
        Self {
            keys: Arc::new(keys),
            delays,
        }
    }
}

impl<S: KeyInputSource + 'static> SaveAutomation for TimedSaveSequence<S> {
    async fn attempt_save(&self, target: &Path) -> bool {
        let keys = Arc::clone(&self.keys);
        let delays = self.delays.clone();
        let target = target.to_path_buf();
        let backend = keys.backend_name().to_string();

        // The sequence sleeps and talks to the OS input system synchronously;
        // keep it off the async workers.
        let outcome =
            tokio::task::spawn_blocking(move || run_sequence(&*keys, &delays, &target)).await;

        match outcome {
            Ok(Ok(())) => {
                info!(%backend, "save sequence completed");
                true
            }
            Ok(Err(e)) => {
                warn!(%backend, error = %e, "save sequence failed");
                false
            }
            Err(join) => {
                error!(%backend, error = %join, "save sequence aborted");
                false
            }
        }
    }
}

/// Run the full sequence on the current thread.
pub fn run_sequence(
    keys: &dyn KeyInputSource,
    delays: &DelayProfile,
    target: &Path,
) -> Result<()> {
    let path_text = path_keystrokes(target)?;
    let mut input = keys.open()?;

    debug!(wait_ms = delays.dialog_settle_ms, "waiting for save dialog");
    std::thread::sleep(delays.dialog_settle());

    debug!(path = %path_text, "typing save path");
    input.type_text(&path_text)?;
    std::thread::sleep(delays.keystroke_settle());

    debug!("confirming path");
    input.press_confirm()?;
    std::thread::sleep(delays.confirm_settle());

    debug!("confirming save");
    input.press_confirm()?;

    debug!(wait_ms = delays.flush_ms, "waiting for file to flush");
    std::thread::sleep(delays.flush());
    Ok(())
}

/// The exact text typed into the dialog's filename box.
fn path_keystrokes(target: &Path) -> Result<String> {
    let absolute: PathBuf = std::path::absolute(target)?;
    absolute.to_str().map(str::to_string).ok_or_else(|| {
        LabelwerkError::Automation(format!(
            "save path is not valid UTF-8: {}",
            absolute.display()
        ))
    })
}
