// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for keystroke injection.

use labelwerk_core::error::Result;

/// An open connection to the platform's input system.
///
/// Implementations are not required to be `Send`: a connection is opened,
/// used, and dropped on one blocking thread.
pub trait KeyInput {
    /// Type `text` as literal keystrokes into the focused window.
    fn type_text(&mut self, text: &str) -> Result<()>;

    /// Press and release the dialog confirm key (Enter).
    fn press_confirm(&mut self) -> Result<()>;
}

/// Opens `KeyInput` connections.
pub trait KeyInputSource: Send + Sync {
    /// Human-readable backend name for logs (e.g. "enigo", "stub").
    fn backend_name(&self) -> &str;

    /// Open a fresh connection for one sequence.
    fn open(&self) -> Result<Box<dyn KeyInput>>;
}

impl<T: KeyInputSource + ?Sized> KeyInputSource for Box<T> {
    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }

    fn open(&self) -> Result<Box<dyn KeyInput>> {
        (**self).open()
    }
}
