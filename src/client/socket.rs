use crate::client::error::{ClientError, Result};
use crate::net::Timeouts;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use tracing::{debug, warn};

/// Byte-stream operations the client session is built on
pub trait Transport: Send {
    /// Write all of `buf` to the peer
    fn send_bytes(&mut self, buf: &[u8]) -> Result<()>;

    /// Single read of whatever the peer has sent, up to `buf.len()` bytes.
    /// Zero means the peer closed the connection.
    fn recv_response(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Apply read/write timeouts
    fn set_timeouts(&self, timeouts: &Timeouts) -> Result<()>;
}

/// TCP-based implementation of Transport
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to a remote address
    pub fn connect(addr: &str) -> Result<Self> {
        debug!(addr = addr, "Connecting TCP stream");
        let stream = TcpStream::connect(addr).map_err(|source| {
            warn!(error = %source, "Failed to connect");
            ClientError::Connect {
                addr: addr.to_string(),
                source,
            }
        })?;
        stream.set_nodelay(true)?;
        debug!("Stream connected successfully");
        Ok(Self { stream })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }
}

impl Transport for TcpTransport {
    fn send_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.flush()?;
        debug!(bytes_sent = buf.len(), "Bytes sent");
        Ok(())
    }

    fn recv_response(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self.stream.read(buf)?;
        debug!(bytes_received = len, "Response received");
        Ok(len)
    }

    fn set_timeouts(&self, timeouts: &Timeouts) -> Result<()> {
        debug!(?timeouts, "Setting socket timeouts");
        timeouts.apply(&self.stream)?;
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        // Already shut down when the server closed first; nothing to report.
        self.stream.shutdown(Shutdown::Both).ok();
    }
}


#[cfg(test)]
pub use tests::MockTransport;
