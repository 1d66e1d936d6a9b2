//! Termination signals.

use std::fmt;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// The signal that ended the serving phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Resolves on the first of Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires, so the
/// other one still works.
pub async fn wait_for_signal() -> Signal {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(err) => never("SIGINT", err).await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                Signal::Terminate
            }
            Err(err) => never("SIGTERM", err).await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Signal>();

    let received = tokio::select! {
        signal = interrupt => signal,
        signal = terminate => signal,
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal = %received,
        "Shutdown requested, no longer accepting connections"
    );
    received
}

async fn never(name: &'static str, err: std::io::Error) -> Signal {
    tracing::error!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal = name,
        error = %err,
        "Cannot listen for signal"
    );
    std::future::pending().await
}
