//! Logging around the serving phase.

use std::future::Future;
use std::io;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Awaits `serving` and reports how the HTTP server ended.
pub async fn observe<F>(config: &ServerConfig, serving: F) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %config.server_addr(),
        public = config.binds_to_all_interfaces(),
        "Listening for requests"
    );

    let started = Instant::now();
    let outcome = serving.await;
    let uptime_secs = started.elapsed().as_secs();

    match &outcome {
        Ok(()) => tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            uptime_secs,
            "HTTP server stopped"
        ),
        Err(err) => tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            hint = bind_hint(err.kind()).unwrap_or_default(),
            uptime_secs,
            "HTTP server failed"
        ),
    }

    outcome
}

/// Returns an operator hint for socket errors raised while binding.
fn bind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::AddrInUse => Some("another process owns PORT"),
        io::ErrorKind::AddrNotAvailable => Some("HOST is not an address of this machine"),
        io::ErrorKind::PermissionDenied => Some("ports below 1024 need elevated privileges"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clean_stop_is_ok() {
        let result = observe(&ServerConfig::default(), async { Ok(()) }).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn failure_is_passed_through() {
        let serving = async { Err(io::Error::from(io::ErrorKind::AddrInUse)) };
        let err = observe(&ServerConfig::default(), serving).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[test]
    fn hints_cover_bind_errors() {
        assert!(bind_hint(io::ErrorKind::AddrInUse).is_some());
        assert!(bind_hint(io::ErrorKind::TimedOut).is_none());
    }
}
