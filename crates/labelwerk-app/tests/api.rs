// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integration tests for the HTTP API, driven through the full middleware
// stack with `tower::ServiceExt::oneshot`.

#![cfg(unix)]

use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use labelwerk_app::build_app;
use labelwerk_app::config::ServerConfig;
use labelwerk_app::state::AppState;
use labelwerk_core::{DelayProfile, ServiceConfig};
use labelwerk_print::{PrintService, SaveAutomation};

/// Writes `bytes` bytes to the target when set, then reports `report`.
struct FakeSave {
    bytes: Option<usize>,
    report: bool,
}

impl SaveAutomation for FakeSave {
    async fn attempt_save(&self, target: &Path) -> bool {
        if let Some(n) = self.bytes {
            std::fs::write(target, vec![b'%'; n]).unwrap();
        }
        self.report
    }
}

struct TestApp {
    dir: TempDir,
    app: Router,
}

impl TestApp {
    fn output_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("output")
    }
}

fn test_app(save: FakeSave) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        tool_executable: "/bin/sh".into(),
        tool_args: vec!["-c".into(), "exit 0".into(), "tool".into()],
        templates_dir: dir.path().join("templates"),
        output_dir: dir.path().join("output"),
        scratch_dir: Some(dir.path().join("scratch")),
        delays: DelayProfile::immediate(),
        ..Default::default()
    };
    std::fs::create_dir_all(&config.templates_dir).unwrap();
    std::fs::write(config.templates_dir.join("test.btw"), b"template").unwrap();

    let service = PrintService::new(config, save).unwrap();
    let server = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 30,
    };
    let app = build_app(AppState::new(service), &server).unwrap();
    TestApp { dir, app }
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn phone_label() -> Value {
    json!({
        "template_name": "test",
        "username": "op1",
        "data_sources": {"ProductName": "Phone", "SerialNumber": "SN20241212001"}
    })
}

// ---------------------------------------------------------------------------
// Service metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_healthy() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });
    let response = get(&t.app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn banner_and_info_describe_the_api() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });

    let banner = body_json(get(&t.app, "/").await).await;
    assert_eq!(banner["service"], "labelwerk");
    assert_eq!(banner["api"], "/api/v1");

    let info = body_json(get(&t.app, "/api/v1/info").await).await;
    let endpoints = info["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e.as_str().unwrap().contains("POST /api/v1/print")));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });
    assert_eq!(get(&t.app, "/nope").await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn print_success_then_list_status_and_download() {
    let t = test_app(FakeSave { bytes: Some(100), report: true });

    let response = post_json(&t.app, "/api/v1/print", phone_label()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["success"], true);
    assert_eq!(result["file_size"], 100);
    let filename = result["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("op1_test_"));
    assert_eq!(result["download_url"], format!("/api/v1/files/{filename}"));
    assert!(result.get("retriable").is_none());

    let listing = body_json(get(&t.app, "/api/v1/files").await).await;
    assert_eq!(listing["success"], true);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["files"][0]["filename"], filename.as_str());

    let status = body_json(get(&t.app, &format!("/api/v1/status/{filename}")).await).await;
    assert_eq!(status["exists"], true);
    assert_eq!(status["size_bytes"], 100);

    let download = get(&t.app, &format!("/api/v1/files/{filename}")).await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = download.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
    let bytes = download.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.len(), 100);
}

#[tokio::test]
async fn missing_template_is_400_with_suggestion() {
    let t = test_app(FakeSave { bytes: Some(100), report: true });

    let response = post_json(
        &t.app,
        "/api/v1/print",
        json!({"template_name": "ghost", "data_sources": {}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let result = body_json(response).await;
    assert_eq!(result["success"], false);
    assert_eq!(result["error_kind"], "template_not_found");
    assert_eq!(result["template"], "ghost");
    assert!(result["suggestion"].is_string());
    assert_eq!(result["retriable"], false);
    assert_eq!(std::fs::read_dir(t.output_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn automation_failure_is_400() {
    let t = test_app(FakeSave { bytes: None, report: false });

    let response = post_json(&t.app, "/api/v1/print", phone_label()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let result = body_json(response).await;
    assert_eq!(result["error_kind"], "automation_failure");
    assert_eq!(result["retriable"], true);
}

#[tokio::test]
async fn malformed_body_is_a_json_400() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });

    let response = post_json(&t.app, "/api/v1/print", json!({"data_sources": {}})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn explicit_output_filename_is_used() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });

    let mut body = phone_label();
    body["output_filename"] = json!("batch-7");
    let result = body_json(post_json(&t.app, "/api/v1/print", body).await).await;

    assert!(result["filename"].as_str().unwrap().starts_with("batch-7_"));
}

// ---------------------------------------------------------------------------
// Artifact lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_of_unknown_file_reports_not_existing() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });

    let response = get(&t.app, "/api/v1/status/nothing.pdf").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);
    assert_eq!(json["filename"], "nothing.pdf");
}

#[tokio::test]
async fn download_of_unknown_file_is_404() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });
    let response = get(&t.app, "/api/v1/files/nothing.pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_output_lists_nothing() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });
    let listing = body_json(get(&t.app, "/api/v1/files").await).await;
    assert_eq!(listing["count"], 0);
    assert!(listing["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let t = test_app(FakeSave { bytes: Some(10), report: true });

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/print")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}
