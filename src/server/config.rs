//! Server configuration module
//!
//! Provides CLI argument parsing and validation for the Axon server.

use crate::logging::validate_level;
use crate::net::Timeouts;
use clap::Parser;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "axon-server")]
#[command(about = "Concurrent TCP server that acknowledges length-framed messages")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Bind port (0 picks an ephemeral port)
    #[arg(long, default_value_t = 5050)]
    pub port: u16,

    /// Name shown in the startup banner
    #[arg(long, default_value = "CENTRAL SERVER")]
    pub name: String,

    /// Per-connection read timeout in milliseconds (none by default)
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Per-connection write timeout in milliseconds (none by default)
    #[arg(long)]
    pub write_timeout_ms: Option<u64>,

    /// How often the accept loop checks for shutdown, in milliseconds
    #[arg(long, default_value_t = 50)]
    pub accept_poll_ms: u64,

    /// Show a live status line with connection counters
    #[arg(long)]
    pub status: bool,

    /// Status line update interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub status_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5050,
            name: "CENTRAL SERVER".to_string(),
            read_timeout_ms: None,
            write_timeout_ms: None,
            accept_poll_ms: 50,
            status: false,
            status_interval_ms: 100,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns the full bind address as a string (bind:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), String> {
        debug!("Validating server configuration");

        if self.accept_poll_ms == 0 {
            return Err("accept_poll_ms must be > 0".into());
        }

        if self.status_interval_ms == 0 {
            return Err("status_interval_ms must be > 0".into());
        }

        if self.read_timeout_ms == Some(0) || self.write_timeout_ms == Some(0) {
            return Err("timeouts must be > 0 when given".into());
        }

        validate_level(&self.log_level)?;

        debug!("Server configuration validated successfully");
        Ok(())
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts::from_millis(self.read_timeout_ms, self.write_timeout_ms)
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}
