// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// studentreports binary: migrate the database, then serve the report API.

use std::process;
use std::sync::Arc;

use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

use studentreports_core::error::ReportError;
use studentreports_server::config::{self, Command, LoadError, ServeArgs, Settings};
use studentreports_server::{ReportPipeline, http, telemetry};

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("{0}")]
    Telemetry(String),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

/// Log through the installed subscriber, or a throwaway one if telemetry
/// never came up.
fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    let command = cli_args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::Telemetry)?;

    match command {
        Command::Serve(_) => run_serve(settings).await,
        Command::Migrate(_) => run_migrate(&settings),
    }
}

fn run_migrate(settings: &Settings) -> Result<(), AppError> {
    let applied = studentreports_data::migrate(&settings.database.path)?;
    info!(
        applied,
        path = %settings.database.path.display(),
        "migrations complete"
    );
    Ok(())
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    // A database that cannot be migrated is reported per request instead.
    if let Err(err) = studentreports_data::migrate(&settings.database.path) {
        error!(
            error = %err,
            path = %settings.database.path.display(),
            "boot migration failed; continuing"
        );
    }

    let pipeline = Arc::new(ReportPipeline::from_settings(&settings)?);
    let router = http::router(pipeline);

    let listener = tokio::net::TcpListener::bind(settings.server.addr).await?;
    info!(
        addr = %settings.server.addr,
        printer = %settings.report.printer_name,
        cups = %settings.printer.cups_uri,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
