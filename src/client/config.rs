use crate::client::constants::{DEFAULT_OUTPUT_FILE, PING_INTERVAL_MS};
use crate::client::error::{ClientError, Result};
use crate::client::session::PingOptions;
use crate::logging::validate_level;
use crate::net::Timeouts;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "axon-client")]
#[command(about = "Send framed messages to an Axon server and measure round-trip latency")]
pub struct ClientConfig {
    /// Server host to connect to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub server: String,

    /// Server port to connect to
    #[arg(short, long, default_value_t = 5050)]
    pub port: u16,

    /// Number of clients to open, each sending the message once
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,

    /// Message to send to the server
    #[arg(short, long, default_value = "Hello world!")]
    pub message: String,

    /// Ping the server continuously after sending (first client only)
    #[arg(long)]
    pub ping: bool,

    /// Stop pinging after this many samples (runs until interrupted otherwise)
    #[arg(long)]
    pub pings: Option<usize>,

    /// Pause between pings in milliseconds
    #[arg(long, default_value_t = PING_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Export ping samples to the output file
    #[arg(long)]
    pub save: bool,

    /// File ping samples are exported to
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Plot ping samples in the terminal
    #[arg(long)]
    pub plot: bool,

    /// Socket read/write timeout in milliseconds (none by default)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Hide per-ping output and the live spinner
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl ClientConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts::from_millis(self.timeout_ms, self.timeout_ms)
    }

    pub fn ping_options(&self) -> PingOptions {
        PingOptions {
            interval: Duration::from_millis(self.interval_ms),
            count: self.pings,
            collect: self.save || self.plot,
            quiet: self.quiet,
        }
    }

    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating client configuration");
        if self.count == 0 {
            return Err(ClientError::Config("count must be > 0".into()));
        }
        validate_common(self.pings, self.interval_ms, self.timeout_ms, &self.log_level)?;
        debug!("Client configuration validated successfully");
        Ok(())
    }
}

/// Options of the dedicated ping tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "axon-ping")]
#[command(about = "Ping an Axon server until interrupted and summarize the latency")]
pub struct PingConfig {
    /// Server host to connect to
    #[arg(short, long, default_value = "0.0.0.0")]
    pub server: String,

    /// Server port to connect to
    #[arg(short, long, default_value_t = 5050)]
    pub port: u16,

    /// Stop after this many samples (runs until interrupted otherwise)
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Pause between pings in milliseconds
    #[arg(long, default_value_t = PING_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Export samples to the output file
    #[arg(long)]
    pub save: bool,

    /// File samples are exported to
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Skip the latency plot
    #[arg(long)]
    pub no_plot: bool,

    /// Socket read/write timeout in milliseconds (none by default)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl PingConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts::from_millis(self.timeout_ms, self.timeout_ms)
    }

    pub fn ping_options(&self) -> PingOptions {
        PingOptions {
            interval: Duration::from_millis(self.interval_ms),
            count: self.count,
            collect: self.save || !self.no_plot,
            quiet: false,
        }
    }

    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    pub fn validate(&self) -> Result<()> {
        validate_common(self.count, self.interval_ms, self.timeout_ms, &self.log_level)
    }
}

fn validate_common(
    pings: Option<usize>,
    interval_ms: u64,
    timeout_ms: Option<u64>,
    log_level: &str,
) -> Result<()> {
    if pings == Some(0) {
        return Err(ClientError::Config("ping count must be > 0".into()));
    }
    if interval_ms == 0 {
        return Err(ClientError::Config("interval must be > 0".into()));
    }
    if timeout_ms == Some(0) {
        return Err(ClientError::Config("timeout must be > 0".into()));
    }
    validate_level(log_level).map_err(ClientError::Config)
}
