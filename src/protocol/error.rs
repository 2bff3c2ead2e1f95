use thiserror::Error;

/// Protocol-level errors for frame encoding/decoding
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame header: {0}")]
    Framing(String),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Payload too large to frame: length needs {digits} digits, header holds {max}")]
    Encoding { digits: usize, max: usize },

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// True when the peer went away cleanly (empty or short read).
    pub fn is_closed(&self) -> bool {
        matches!(self, ProtocolError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
