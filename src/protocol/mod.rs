//! Wire protocol for Axon
//!
//! Every message travels as a frame: a 64-byte header holding the payload
//! length as space-padded decimal ASCII, followed by the UTF-8 payload.

pub mod error;
pub mod frame;
pub mod message;

pub use error::{ProtocolError, Result as ProtocolResult};
pub use frame::{decode_header, encode, read_frame, write_frame, Frame, HEADER_SIZE};
pub use message::{Message, ACK_MESSAGE, DISCONNECT_MESSAGE, PING_MESSAGE};
