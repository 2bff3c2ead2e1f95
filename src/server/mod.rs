//! Server module for the Axon acknowledgement server

pub mod acceptor;
pub mod config;
pub mod error;
pub mod handler;
pub mod monitor;

pub use acceptor::Server;
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use handler::{CloseReason, ConnectionHandler, HandlerOutcome, HandlerState};
pub use monitor::{ConnectionGuard, ServerCounters, ServerMonitor, ServerStats};
