// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk — label printing service
//
// Entry point. Loads configuration, builds the print service with the
// platform keystroke backend, and serves the HTTP API until shut down.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labelwerk_bridge::platform_keys;
use labelwerk_core::ServiceConfig;
use labelwerk_core::error::Result;
use labelwerk_print::{PrintService, TimedSaveSequence};

use labelwerk_app::build_app;
use labelwerk_app::config::ServerConfig;
use labelwerk_app::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "labelwerk failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let server = ServerConfig::from_env()?;
    let service_config = ServiceConfig::from_env()?;
    tracing::info!(host = %server.host, port = server.port, "loaded server configuration");

    let keys = platform_keys();
    tracing::info!(backend = keys.backend_name(), "keystroke backend selected");
    let automation = TimedSaveSequence::new(keys, service_config.delays.clone());
    let service = PrintService::new(service_config, automation)?;

    let app = build_app(AppState::new(service), &server)?;

    let addr = server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "labelwerk listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("graceful shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
