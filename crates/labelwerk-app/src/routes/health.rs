// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use labelwerk_print::SaveAutomation;

use crate::routes::API_PREFIX;
use crate::state::AppState;

const SERVICE_NAME: &str = "labelwerk";

#[derive(Serialize)]
pub struct Banner {
    pub service: &'static str,
    pub version: &'static str,
    pub api: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
}

/// GET / -- service banner.
async fn banner() -> Json<Banner> {
    Json(Banner {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        api: API_PREFIX,
        status: "running",
    })
}

/// GET /health -- liveness only; the external tool is not checked.
async fn health_check<A: SaveAutomation>(State(state): State<AppState<A>>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: now,
        uptime_secs: (now - state.started_at).num_seconds(),
    })
}

/// Root-level routes, NOT under `/api/v1`.
pub fn router<A: SaveAutomation>() -> Router<AppState<A>> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check::<A>))
}
