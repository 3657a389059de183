// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Real keystroke injection via `enigo`.
//
// The service must run inside the interactive desktop session that owns the
// label designer's window; a service-session process has no keyboard focus
// to type into.

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::debug;

use labelwerk_core::error::{LabelwerkError, Result};

use crate::traits::{KeyInput, KeyInputSource};

/// Opens an `enigo` connection per sequence.
#[derive(Default)]
pub struct DesktopKeys {
    settings: Settings,
}

impl KeyInputSource for DesktopKeys {
    fn backend_name(&self) -> &str {
        "enigo"
    }

    fn open(&self) -> Result<Box<dyn KeyInput>> {
        let enigo = Enigo::new(&self.settings)
            .map_err(|e| LabelwerkError::KeyInput(format!("connect to input system: {e}")))?;
        debug!("enigo connection opened");
        Ok(Box::new(EnigoInput { enigo }))
    }
}

struct EnigoInput {
    enigo: Enigo,
}

impl KeyInput for EnigoInput {
    fn type_text(&mut self, text: &str) -> Result<()> {
        self.enigo
            .text(text)
            .map_err(|e| LabelwerkError::KeyInput(format!("type text: {e}")))
    }

    fn press_confirm(&mut self) -> Result<()> {
        self.enigo
            .key(Key::Return, Direction::Click)
            .map_err(|e| LabelwerkError::KeyInput(format!("press Enter: {e}")))
    }
}
