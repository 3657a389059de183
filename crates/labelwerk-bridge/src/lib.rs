// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk — Keystroke backends for driving the label designer's save dialog.
//
// The save automation only ever needs two gestures: type literal text and
// press the confirm key. Backends implement `KeyInput`; a `KeyInputSource`
// opens one for the duration of a single sequence.

pub mod traits;

#[cfg(feature = "desktop")]
pub mod desktop;

pub mod stub;

pub use traits::{KeyInput, KeyInputSource};

/// Keystroke source for this build.
///
/// With the `desktop` feature this injects real key events into the
/// interactive session. Without it every sequence fails immediately with a
/// `KeyInput` error, which keeps headless/CI builds honest.
pub fn platform_keys() -> Box<dyn KeyInputSource> {
    #[cfg(feature = "desktop")]
    {
        Box::new(desktop::DesktopKeys::default())
    }
    #[cfg(not(feature = "desktop"))]
    {
        Box::new(stub::StubKeys)
    }
}
