#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;
mod startup;

use std::process::ExitCode;

use anyhow::Context;
use axum::Router;
use nlprag_pipeline::{Pipeline, WorkerPool};
use nlprag_server::middleware::{RouterObservabilityExt, RouterRecoveryExt};
use nlprag_server::{ServiceState, routes};

use crate::config::{Cli, create_context};

pub const TRACING_TARGET_SERVER_STARTUP: &str = "nlprag_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "nlprag_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "nlprag_cli::config";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => {
            tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, "Stopped cleanly");
            ExitCode::SUCCESS
        }
        Err(error) => {
            // Failures before tracing is installed would otherwise be silent.
            eprintln!("nlprag: {error:#}");
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = format!("{error:#}"),
                "Stopped with an error"
            );
            ExitCode::FAILURE
        }
    }
}

/// Builds every component, serves until a signal arrives, then drains the workers.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "Starting"
    );

    cli.log();
    cli.validate()?;

    let ctx = create_context(&cli).await?;
    startup::prepare_collections(&ctx, &cli.qdrant).await?;
    startup::seed_collections(&ctx, &cli.pipeline).await?;
    startup::log_data_check(&ctx).await;

    let pipeline = Pipeline::new(ctx);
    let workers = WorkerPool::spawn(pipeline.clone(), &cli.pipeline)
        .context("failed to start background workers")?;

    let state = ServiceState::new(pipeline, workers.queue());
    let router = create_router(state, &cli);

    let served = server::serve(router, cli.server.clone()).await;

    workers
        .shutdown()
        .await
        .context("failed to drain background workers")?;

    served.context("HTTP server failed")?;
    Ok(())
}

/// Recovery wraps observability, which wraps the routes.
fn create_router(state: ServiceState, cli: &Cli) -> Router {
    routes(state)
        .with_observability()
        .with_recovery(&cli.recovery)
}
