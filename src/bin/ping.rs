use anyhow::{Context, Result};
use axon::client::{ClientSession, LatencyPlot, OutputWriter, PingConfig};
use axon::logging::init_logging_with_config;
use axon::shutdown::install_interrupt_handler;
use clap::Parser;
use tracing::{error, info, Dispatch};

fn main() {
    let config = PingConfig::parse();

    let dispatch = init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, dispatch) {
        error!(error = %e, "Ping failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: PingConfig, dispatch: Dispatch) -> Result<()> {
    let shutdown = install_interrupt_handler();

    let mut session = ClientSession::connect(
        &config.server,
        config.port,
        config.timeouts(),
        dispatch,
    )
    .with_context(|| format!("Could not reach {}:{}", config.server, config.port))?;

    if config.save {
        session = session.with_sink(Box::new(OutputWriter::new(&config.output)));
    }
    if !config.no_plot {
        session = session.with_sink(Box::new(LatencyPlot::default()));
    }

    let report = session.ping(&config.ping_options(), &shutdown);
    info!(samples = report.samples.len(), "Connection closed.");
    Ok(())
}
