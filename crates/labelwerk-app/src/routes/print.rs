// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// POST /api/v1/print

use std::collections::BTreeMap;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use labelwerk_core::types::{JobRequest, JobResult};
use labelwerk_print::SaveAutomation;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for a print job.
#[derive(Debug, Deserialize)]
pub struct PrintBody {
    pub template_name: String,
    /// Template field values. Non-string JSON values are printed in their
    /// JSON text form; `null` prints as an empty string.
    #[serde(default)]
    pub data_sources: BTreeMap<String, Value>,
    #[serde(default)]
    pub username: Option<String>,
    /// Replaces the `{requester}_{template}` part of the saved filename.
    #[serde(default)]
    pub output_filename: Option<String>,
}

impl PrintBody {
    pub fn into_request(self) -> JobRequest {
        // A missing username stays blank so the service applies its
        // configured default requester.
        let mut request = JobRequest::new(self.template_name)
            .with_requester(self.username.unwrap_or_default());
        for (name, value) in self.data_sources {
            request = request.with_field(name, field_text(value));
        }
        if let Some(name) = self.output_filename {
            request = request.with_output_name(name);
        }
        request
    }
}

fn field_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Status code for a finished job: 200, 400 for failures the caller can
/// fix, 500 for failures of the service itself.
pub fn status_for(result: &JobResult) -> StatusCode {
    match result.error_kind {
        None => StatusCode::OK,
        Some(kind) if kind.is_client_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn print_label<A: SaveAutomation>(
    State(state): State<AppState<A>>,
    payload: Result<Json<PrintBody>, JsonRejection>,
) -> AppResult<(StatusCode, Json<JobResult>)> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let result = state.service.submit(body.into_request()).await;
    Ok((status_for(&result), Json(result)))
}

pub fn router<A: SaveAutomation>() -> Router<AppState<A>> {
    Router::new().route("/print", post(print_label::<A>))
}
