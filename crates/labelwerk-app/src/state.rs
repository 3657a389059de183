// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::sync::Arc;

use chrono::{DateTime, Utc};

use labelwerk_print::PrintService;

/// Shared state for all handlers via `State<AppState<A>>`.
///
/// `A` is the save strategy; the binary uses the keystroke sequence, tests
/// use a fake.
pub struct AppState<A> {
    pub service: Arc<PrintService<A>>,
    pub started_at: DateTime<Utc>,
}

impl<A> AppState<A> {
    pub fn new(service: PrintService<A>) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Utc::now(),
        }
    }
}

// Manual impl: `A` itself need not be `Clone`.
impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            started_at: self.started_at,
        }
    }
}
