use anyhow::{Context, Result};
use axon::logging::init_logging_with_config;
use axon::server::{Server, ServerConfig};
use axon::shutdown::install_interrupt_handler;
use clap::Parser;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments
    let config = ServerConfig::parse();

    let dispatch = init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, dispatch) {
        error!(error = %e, "Server failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: ServerConfig, dispatch: tracing::Dispatch) -> Result<()> {
    let shutdown = install_interrupt_handler();

    let server = Server::bind(&config, dispatch)
        .with_context(|| format!("Failed to start server on {}", config.address()))?;

    info!(
        address = %server.local_addr(),
        read_timeout_ms = ?config.read_timeout_ms,
        status = config.status,
        "Axon server ready, press Ctrl-C to stop"
    );

    server.run(&shutdown).context("Accept loop failed")?;
    Ok(())
}
