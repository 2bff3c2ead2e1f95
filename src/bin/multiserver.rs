use anyhow::{Context, Result};
use axon::logging::init_logging_with_config;
use axon::server::{Server, ServerConfig};
use axon::shutdown::install_interrupt_handler;
use clap::Parser;
use std::thread;
use tracing::{error, info, warn, Dispatch};

/// Run several servers on consecutive ports in one process
#[derive(Parser, Debug, Clone)]
#[command(name = "axon-multiserver")]
struct MultiServerConfig {
    /// Number of server instances
    #[arg(short, long, default_value_t = 1)]
    count: u16,

    #[command(flatten)]
    server: ServerConfig,
}

fn main() {
    let config = MultiServerConfig::parse();

    let dispatch = init_logging_with_config(&config.server.log_level, config.server.is_json_format());

    if let Err(e) = config.server.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, dispatch) {
        error!(error = %e, "Multiserver failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: MultiServerConfig, dispatch: Dispatch) -> Result<()> {
    if config.count == 0 {
        anyhow::bail!("count must be > 0");
    }
    let shutdown = install_interrupt_handler();

    let mut servers = Vec::with_capacity(config.count as usize);
    for offset in 0..config.count {
        let port = config
            .server
            .port
            .checked_add(offset)
            .context("Port range exceeds 65535")?;
        let instance = ServerConfig {
            port,
            name: format!("{} {}", config.server.name, offset + 1),
            ..config.server.clone()
        };
        let server = Server::bind(&instance, dispatch.clone())
            .with_context(|| format!("Failed to start server on {}", instance.address()))?;
        servers.push(server);
    }

    let handles: Vec<_> = servers
        .into_iter()
        .map(|server| {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                let addr = server.local_addr();
                (addr, server.run(&shutdown))
            })
        })
        .collect();

    info!(instances = handles.len(), "All servers started");

    let mut failures = 0;
    for handle in handles {
        match handle.join() {
            Ok((_, Ok(()))) => {}
            Ok((addr, Err(e))) => {
                failures += 1;
                warn!(address = %addr, error = %e, "Server stopped with an error");
            }
            Err(_) => {
                failures += 1;
                warn!("Server thread panicked");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} server instance(s) failed", failures);
    }
    Ok(())
}
