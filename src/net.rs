//! Socket-level settings shared by the server and the client

use std::io;
use std::net::TcpStream;
use std::time::Duration;

/// Optional timeouts applied to every blocking read and write on a connection.
///
/// The default is no timeout at all: a stalled peer blocks the reading side
/// indefinitely. That is a known limitation of the protocol, kept as the
/// default so behavior only changes when a timeout is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub read: Option<Duration>,
    pub write: Option<Duration>,
}

impl Timeouts {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from optional millisecond values as given on the command line.
    pub fn from_millis(read_ms: Option<u64>, write_ms: Option<u64>) -> Self {
        Self {
            read: read_ms.map(Duration::from_millis),
            write: write_ms.map(Duration::from_millis),
        }
    }

    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_read_timeout(self.read)?;
        stream.set_write_timeout(self.write)?;
        Ok(())
    }
}
