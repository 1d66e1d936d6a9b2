//! Listener settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Longest grace period accepted for in-flight requests.
const MAX_SHUTDOWN_TIMEOUT_SECS: u64 = 300;

/// Where the HTTP server listens and how long it waits on shutdown.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Address to bind, `0.0.0.0` listens on every interface.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8000)]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds in-flight HTTP requests may keep running after a shutdown
    /// signal. Queued background jobs are drained regardless.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl ServerConfig {
    /// Rejects an ephemeral port and an out-of-range grace period.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("PORT must be a fixed port, not 0");
        }

        if !(1..=MAX_SHUTDOWN_TIMEOUT_SECS).contains(&self.shutdown_timeout) {
            bail!(
                "SHUTDOWN_TIMEOUT must be between 1 and {MAX_SHUTDOWN_TIMEOUT_SECS} seconds, got {}",
                self.shutdown_timeout
            );
        }

        Ok(())
    }

    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Returns whether the listener is reachable from other hosts.
    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            addr = %self.server_addr(),
            shutdown_timeout_secs = self.shutdown_timeout,
            "Listener"
        );
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_publicly_on_8000() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.binds_to_all_interfaces());
        assert_eq!(config.server_addr().port(), 8000);
    }

    #[test]
    fn rejects_port_zero_and_bad_grace_periods() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        for shutdown_timeout in [0, MAX_SHUTDOWN_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                shutdown_timeout,
                ..ServerConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn loopback_is_private() {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ..ServerConfig::default()
        };
        assert!(!config.binds_to_all_interfaces());
    }
}
