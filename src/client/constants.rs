//! Constants used throughout the client

/// Upper bound on the bytes read for one acknowledgement
pub const MAX_RESPONSE_SIZE: usize = 1024;

/// Default pause between two pings in milliseconds
pub const PING_INTERVAL_MS: u64 = 1000;

/// Default file the ping samples are exported to
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Spinner tick interval in milliseconds
pub const PROGRESS_TICK_INTERVAL_MS: u64 = 100;

/// Histogram lower bound in microseconds
pub const HISTOGRAM_LOW_BOUND_US: u64 = 1;

/// Histogram upper bound in microseconds (one minute)
pub const HISTOGRAM_HIGH_BOUND_US: u64 = 60_000_000;

/// Histogram significant digits for precision
pub const HISTOGRAM_SIGNIFICANT_DIGITS: u8 = 3;

/// Rows of the terminal latency plot
pub const PLOT_HEIGHT: usize = 12;

/// Maximum columns of the terminal latency plot
pub const PLOT_WIDTH: usize = 60;
