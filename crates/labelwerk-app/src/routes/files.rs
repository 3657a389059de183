// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact listing, status, and download.

use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};

use labelwerk_core::types::ArtifactMetadata;
use labelwerk_print::SaveAutomation;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct FileList {
    pub success: bool,
    pub count: usize,
    pub files: Vec<ArtifactMetadata>,
}

/// GET /api/v1/files -- newest first.
async fn list_files<A: SaveAutomation>(State(state): State<AppState<A>>) -> Json<FileList> {
    let files = state.service.list_artifacts();
    Json(FileList {
        success: true,
        count: files.len(),
        files,
    })
}

/// GET /api/v1/status/{filename} -- always 200; `exists` says whether it
/// was found.
async fn file_status<A: SaveAutomation>(
    State(state): State<AppState<A>>,
    Path(filename): Path<String>,
) -> AppResult<Json<Value>> {
    let Some(meta) = state.service.artifact_status(&filename) else {
        return Ok(Json(json!({
            "exists": false,
            "filename": filename,
            "message": "file not found",
        })));
    };

    let mut body = serde_json::to_value(&meta).map_err(|e| AppError::Internal(e.to_string()))?;
    if let Value::Object(fields) = &mut body {
        fields.insert("exists".into(), Value::Bool(true));
    }
    Ok(Json(body))
}

/// GET /api/v1/files/{filename} -- the artifact bytes as an attachment.
async fn download_file<A: SaveAutomation>(
    State(state): State<AppState<A>>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let meta = state
        .service
        .artifact_status(&filename)
        .ok_or_else(|| AppError::NotFound(filename.clone()))?;

    let bytes = tokio::fs::read(&meta.file_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(filename.clone())
        } else {
            AppError::Io(e)
        }
    })?;
    tracing::debug!(%filename, bytes = bytes.len(), "serving artifact");

    let disposition = format!("attachment; filename=\"{}\"", meta.filename.replace('"', "_"));
    let disposition =
        HeaderValue::from_str(&disposition).map_err(|e| AppError::Internal(e.to_string()))?;
    let content_type = HeaderValue::from_static(content_type_for(&meta.filename));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

fn content_type_for(filename: &str) -> &'static str {
    let is_pdf = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

pub fn router<A: SaveAutomation>() -> Router<AppState<A>> {
    Router::new()
        .route("/files", get(list_files::<A>))
        .route("/files/{filename}", get(download_file::<A>))
        .route("/status/{filename}", get(file_status::<A>))
}
