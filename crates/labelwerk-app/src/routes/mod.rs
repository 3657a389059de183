// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

pub mod files;
pub mod health;
pub mod print;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use labelwerk_print::SaveAutomation;

use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Everything mounted under [`API_PREFIX`].
pub fn api_routes<A: SaveAutomation>() -> Router<AppState<A>> {
    Router::new()
        .route("/info", get(api_info))
        .merge(print::router())
        .merge(files::router())
}

#[derive(Serialize)]
pub struct ApiInfo {
    pub version: &'static str,
    pub endpoints: Vec<String>,
}

/// GET /api/v1/info -- endpoint summary.
async fn api_info() -> Json<ApiInfo> {
    let endpoints = [
        ("GET ", "/info", "API information"),
        ("POST", "/print", "print a label to PDF"),
        ("GET ", "/files", "list saved artifacts"),
        ("GET ", "/status/{filename}", "artifact status"),
        ("GET ", "/files/{filename}", "download an artifact"),
    ]
    .into_iter()
    .map(|(method, path, what)| format!("{method} {API_PREFIX}{path} - {what}"))
    .collect();

    Json(ApiInfo {
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}
