//! Logging setup
//!
//! Components never install a subscriber themselves. They hold a
//! [`Dispatch`] handed to them at construction and emit their events under
//! it, so a binary, a test, or an embedding application decides where logs go.

use tracing::Dispatch;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Build a dispatcher with configurable level and format.
///
/// The level can be overridden via the `RUST_LOG` environment variable.
/// Examples:
/// - `RUST_LOG=info` - Info level and above
/// - `RUST_LOG=debug` - Debug level and above
/// - `RUST_LOG=axon=debug` - Debug level for axon crate only
pub fn build_dispatch(level: &str, json: bool) -> Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(false)
            .with_thread_names(true)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_names(true)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer);

    Dispatch::new(subscriber)
}

/// Build a dispatcher and install it as the process-wide default.
///
/// Returns the dispatcher so it can also be injected into components
/// explicitly. Only binaries should call this.
pub fn init_logging_with_config(level: &str, json: bool) -> Dispatch {
    let dispatch = build_dispatch(level, json);
    if tracing::dispatcher::set_global_default(dispatch.clone()).is_err() {
        eprintln!("A global tracing subscriber is already installed; keeping it");
    }
    dispatch
}

/// Validate a log level name as accepted by the CLI options.
pub fn validate_level(level: &str) -> Result<(), String> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(format!(
            "log_level must be one of: {}",
            valid_levels.join(", ")
        ))
    }
}
