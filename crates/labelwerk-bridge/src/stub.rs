// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub keystroke source for headless/CI builds without the `desktop` feature.

use labelwerk_core::error::{LabelwerkError, Result};

use crate::traits::{KeyInput, KeyInputSource};

/// Source that refuses to open; every save sequence fails fast.
pub struct StubKeys;

impl KeyInputSource for StubKeys {
    fn backend_name(&self) -> &str {
        "stub"
    }

    fn open(&self) -> Result<Box<dyn KeyInput>> {
        tracing::warn!("KeyInputSource::open called on stub backend");
        Err(LabelwerkError::KeyInput(
            "this build has no keystroke backend (enable the `desktop` feature)".into(),
        ))
    }
}
