//! Command-line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use procgate_core::ConnectionConfig;

/// Default `EnvFilter` directives when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info,procgate_server=debug,procgate_services=debug,procgate_core=info,procgate_driver_oracle=info,tower_http=info";

/// Every option can be given as a flag or through its environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "procgate", version, about = "HTTP gateway for Oracle stored procedure calls")]
pub struct ServerConfig {
    /// Oracle listener host
    #[arg(long, env = "ORACLE_HOST", default_value = "localhost")]
    pub oracle_host: String,

    /// Oracle listener port
    #[arg(long, env = "ORACLE_PORT", default_value_t = 1521)]
    pub oracle_port: u16,

    /// Oracle user
    #[arg(long, env = "ORACLE_USER", default_value = "app")]
    pub oracle_user: String,

    /// Oracle password
    #[arg(long, env = "ORACLE_PASSWORD", default_value = "password", hide_env_values = true, hide_default_value = true)]
    pub oracle_password: String,

    /// Oracle service name
    #[arg(long, env = "ORACLE_SID", default_value = "FREEPDB1")]
    pub oracle_sid: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub server_host: String,

    /// Port the HTTP server listens on
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub server_port: u16,

    /// Upper bound for one procedure call, in seconds
    #[arg(long, env = "PROCGATE_CALL_TIMEOUT_SECS", default_value_t = 60)]
    pub call_timeout_secs: u64,

    /// How long in-flight requests may run after a shutdown signal, in seconds
    #[arg(long, env = "PROCGATE_SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "PROCGATE_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Directory for daily-rolling JSON log files
    #[arg(long, env = "PROCGATE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Write JSON log files in addition to console output
    #[arg(long, env = "PROCGATE_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(
            self.oracle_host.clone(),
            self.oracle_port,
            self.oracle_sid.clone(),
            self.oracle_user.clone(),
            self.oracle_password.clone(),
        )
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server_host, self.server_port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {}", addr, e))
    }
}
