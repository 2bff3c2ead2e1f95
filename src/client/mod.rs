//! Client module for sending framed messages and measuring latency

pub mod config;
pub mod constants;
pub mod error;
pub mod plot;
pub mod progress;
pub mod reporter;
pub mod session;
pub mod sink;
pub mod socket;
pub mod statistics;

pub use config::{ClientConfig, PingConfig};
pub use constants::*;
pub use error::{ClientError, Result};
pub use plot::{LatencyPlot, PlotError};
pub use progress::PingProgress;
pub use reporter::Reporter;
pub use session::{ClientSession, PingOptions, PingReport};
pub use sink::{LatencySink, OutputWriter};
pub use socket::{TcpTransport, Transport};
pub use statistics::PingStatistics;
