//! HTTP server startup and graceful shutdown.

mod lifecycle;
mod shutdown;

use std::future::IntoFuture;
use std::io;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use self::shutdown::wait_for_signal;
use crate::TRACING_TARGET_SERVER_SHUTDOWN;
use crate::config::ServerConfig;

/// Serves `app` until a shutdown signal arrives.
///
/// In-flight requests get `SHUTDOWN_TIMEOUT` to finish after the signal;
/// requests still running after that are abandoned.
pub async fn serve(app: Router, config: ServerConfig) -> io::Result<()> {
    let listener = TcpListener::bind(config.server_addr()).await?;
    let shutdown_timeout = config.shutdown_timeout();

    let serving = async move {
        let shutting_down = CancellationToken::new();
        let signal = {
            let shutting_down = shutting_down.clone();
            async move {
                wait_for_signal().await;
                shutting_down.cancel();
            }
        };

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();

        let deadline = async {
            shutting_down.cancelled().await;
            tokio::time::sleep(shutdown_timeout).await;
        };

        tokio::select! {
            result = server => result,
            () = deadline => {
                tracing::warn!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    timeout_secs = shutdown_timeout.as_secs(),
                    "In-flight requests did not finish before the shutdown timeout"
                );
                Ok(())
            }
        }
    };

    lifecycle::observe(&config, serving).await
}
