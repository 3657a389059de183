// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk HTTP service — router and middleware assembly.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_print::SaveAutomation;

use config::ServerConfig;
use state::AppState;

/// Full application: routes plus the middleware stack.
///
/// A request that hits the timeout only loses its response. A job that
/// already holds the tool still runs to completion and its artifact is
/// saved; jobs still queued behind it are abandoned.
pub fn build_app<A: SaveAutomation>(state: AppState<A>, config: &ServerConfig) -> Result<Router> {
    let budget = state.service.job_budget();
    if !timeout_covers_job(config, budget) {
        tracing::warn!(
            request_timeout_secs = config.request_timeout_secs,
            job_budget_secs = budget.as_secs_f64(),
            "request timeout is shorter than one print job; responses will be lost"
        );
    }
    let cors = build_cors_layer(config)?;
    let request_id_header = HeaderName::from_static("x-request-id");

    Ok(Router::new()
        .merge(routes::health::router::<A>())
        .nest(routes::API_PREFIX, routes::api_routes::<A>())
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state))
}

/// Whether one job, started the moment its request arrives, finishes inside
/// the request timeout.
pub fn timeout_covers_job(config: &ServerConfig, job_budget: Duration) -> bool {
    Duration::from_secs(config.request_timeout_secs) > job_budget
}

/// CORS from configuration; `*` allows any origin.
fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if config.allows_any_origin() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| LabelwerkError::Config(format!("CORS origin {o:?}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(origins))
}
