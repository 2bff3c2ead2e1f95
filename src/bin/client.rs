use anyhow::{Context, Result};
use axon::client::{ClientConfig, ClientSession, LatencyPlot, OutputWriter};
use axon::logging::init_logging_with_config;
use axon::shutdown::install_interrupt_handler;
use clap::Parser;
use tracing::{error, info, Dispatch};

fn main() {
    let config = ClientConfig::parse();

    let dispatch = init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, dispatch) {
        error!(error = %e, "Client failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: ClientConfig, dispatch: Dispatch) -> Result<()> {
    let shutdown = install_interrupt_handler();

    let mut sessions = Vec::with_capacity(config.count);
    for index in 0..config.count {
        let mut session = ClientSession::connect(
            &config.server,
            config.port,
            config.timeouts(),
            dispatch.clone(),
        )
        .with_context(|| format!("Client {} could not connect", index + 1))?;
        session.send(&config.message);
        sessions.push(session);
    }

    let mut sessions = sessions.into_iter();
    if config.ping {
        if let Some(first) = sessions.next() {
            let mut session = first;
            if config.save {
                session = session.with_sink(Box::new(OutputWriter::new(&config.output)));
            }
            if config.plot {
                session = session.with_sink(Box::new(LatencyPlot::default()));
            }
            // The ping run ends with its own disconnect.
            session.ping(&config.ping_options(), &shutdown);
        }
    }

    for mut session in sessions {
        session.disconnect();
    }

    info!("Connection closed.");
    Ok(())
}
