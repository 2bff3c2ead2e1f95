use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::frame::{self, Frame};
use std::fmt;

/// Payload that asks the receiver to close the connection without replying
pub const DISCONNECT_MESSAGE: &str = "!DISCONNECT";

/// Payload used by the ping loop; acknowledged but not logged per message
pub const PING_MESSAGE: &str = "!PING";

/// Reply sent by the server for every payload other than a disconnect
pub const ACK_MESSAGE: &str = "Message received!";

/// A decoded payload. Control messages are told apart from application data
/// once, when the payload comes off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Disconnect,
    Ping,
    Data(String),
}

impl Message {
    /// Classify a text payload.
    pub fn from_text(text: &str) -> Self {
        Self::classify(text.to_owned())
    }

    /// Decode a raw payload read from the stream.
    pub fn decode(bytes: Vec<u8>) -> Result<Self> {
        let text = String::from_utf8(bytes)
            .map_err(|e| ProtocolError::Framing(format!("payload is not valid UTF-8: {}", e)))?;
        Ok(Self::classify(text))
    }

    fn classify(text: String) -> Self {
        match text.as_str() {
            DISCONNECT_MESSAGE => Message::Disconnect,
            PING_MESSAGE => Message::Ping,
            _ => Message::Data(text),
        }
    }

    /// The payload string as sent on the wire.
    pub fn as_payload(&self) -> &str {
        match self {
            Message::Disconnect => DISCONNECT_MESSAGE,
            Message::Ping => PING_MESSAGE,
            Message::Data(text) => text,
        }
    }

    pub fn encode(&self) -> Result<Frame> {
        frame::encode(self.as_payload().as_bytes())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}
