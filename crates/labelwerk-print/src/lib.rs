// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk Print — orchestration of label print jobs against an external
// label designer.  A job is rendered into an XML job script, the designer
// is launched on it, a timed keystroke sequence completes its save dialog,
// and the saved artifact is verified on disk.

pub mod registry;
pub mod script;
pub mod sequence;
pub mod service;
pub mod supervisor;
pub mod verify;

pub use registry::ArtifactRegistry;
pub use script::JobPlan;
pub use sequence::{SaveAutomation, TimedSaveSequence};
pub use service::PrintService;
pub use supervisor::ToolSupervisor;
