use crate::protocol::error::{ProtocolError, Result};
use std::io::{ErrorKind, Read, Write};
use tracing::debug;

/// Size of the length header in bytes
pub const HEADER_SIZE: usize = 64;

/// One message unit on the wire: a fixed-width length header plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: [u8; HEADER_SIZE],
    body: Vec<u8>,
}

impl Frame {
    pub fn header(&self) -> &[u8; HEADER_SIZE] {
        &self.header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Frame a payload: the decimal byte length, right-padded with spaces to
/// `HEADER_SIZE` bytes, followed by the payload itself.
pub fn encode(payload: &[u8]) -> Result<Frame> {
    let digits = payload.len().to_string();
    if digits.len() > HEADER_SIZE {
        return Err(ProtocolError::Encoding {
            digits: digits.len(),
            max: HEADER_SIZE,
        });
    }

    let mut header = [b' '; HEADER_SIZE];
    header[..digits.len()].copy_from_slice(digits.as_bytes());

    Ok(Frame {
        header,
        body: payload.to_vec(),
    })
}

/// Decode a length header into the number of payload bytes that follow it.
pub fn decode_header(raw: &[u8]) -> Result<usize> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| ProtocolError::Framing(format!("header is not valid UTF-8: {}", e)))?;
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return Err(ProtocolError::Framing("empty length header".into()));
    }

    trimmed
        .parse::<usize>()
        .map_err(|e| ProtocolError::Framing(format!("invalid length {:?}: {}", trimmed, e)))
}

/// Block until a full header has arrived and return the announced payload length.
pub fn read_header<R: Read>(reader: &mut R) -> Result<usize> {
    let mut raw = [0u8; HEADER_SIZE];
    reader.read_exact(&mut raw).map_err(closed_or_io)?;
    let len = decode_header(&raw)?;
    debug!(payload_len = len, "Frame header decoded");
    Ok(len)
}

/// Block until exactly `len` payload bytes have arrived.
///
/// The buffer grows with the bytes actually received, so a header announcing
/// more data than the peer ever sends ends in `ConnectionClosed` rather than
/// an up-front allocation of the announced size.
pub fn read_body<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut body)
        .map_err(closed_or_io)?;

    if body.len() < len {
        debug!(expected = len, actual = body.len(), "Short frame body");
        return Err(ProtocolError::ConnectionClosed);
    }
    Ok(body)
}

/// Read one complete frame and return its payload.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_header(reader)?;
    read_body(reader, len)
}

/// Write one complete frame for `payload`.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let frame = encode(payload)?;
    writer.write_all(frame.header())?;
    writer.write_all(frame.body())?;
    writer.flush()?;
    Ok(())
}

fn closed_or_io(e: std::io::Error) -> ProtocolError {
    if e.kind() == ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_is_space_padded_decimal() {
        let frame = encode(b"Hello world!").unwrap();
        assert_eq!(frame.header().len(), HEADER_SIZE);
        assert_eq!(&frame.header()[..2], b"12");
        assert!(frame.header()[2..].iter().all(|&b| b == b' '));
        assert_eq!(frame.body(), b"Hello world!");
    }

    #[test]
    fn test_empty_payload() {
        let frame = encode(b"").unwrap();
        assert_eq!(frame.header()[0], b'0');
        assert_eq!(decode_header(frame.header()).unwrap(), 0);
    }

    #[test]
    fn test_decode_header_rejects_garbage() {
        let mut raw = [b' '; HEADER_SIZE];
        raw[..3].copy_from_slice(b"abc");
        assert!(matches!(
            decode_header(&raw),
            Err(ProtocolError::Framing(_))
        ));
    }

    #[test]
    fn test_decode_header_rejects_negative() {
        let mut raw = [b' '; HEADER_SIZE];
        raw[..2].copy_from_slice(b"-5");
        assert!(matches!(
            decode_header(&raw),
            Err(ProtocolError::Framing(_))
        ));
    }

    #[test]
    fn test_decode_header_rejects_invalid_utf8() {
        let mut raw = [b' '; HEADER_SIZE];
        raw[0] = 0xFF;
        assert!(matches!(
            decode_header(&raw),
            Err(ProtocolError::Framing(_))
        ));
    }

    #[test]
    fn test_decode_header_rejects_blank() {
        let raw = [b' '; HEADER_SIZE];
        assert!(decode_header(&raw).is_err());
    }

    #[test]
    fn test_short_header_is_connection_closed() {
        let mut reader = Cursor::new(b"12   ".to_vec());
        let err = read_frame(&mut reader).unwrap_err();
        assert!(err.is_closed());
    }

    #[test]
    fn test_empty_stream_is_connection_closed() {
        let mut reader = Cursor::new(Vec::new());
        assert!(read_header(&mut reader).unwrap_err().is_closed());
    }

    #[test]
    fn test_short_body_is_connection_closed() {
        let frame = encode(b"Hello world!").unwrap();
        let mut wire = frame.header().to_vec();
        wire.extend_from_slice(b"Hello");
        let mut reader = Cursor::new(wire);
        assert!(read_frame(&mut reader).unwrap_err().is_closed());
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"first").unwrap();
        write_frame(&mut wire, b"second").unwrap();

        let mut reader = Cursor::new(wire);
        assert_eq!(read_frame(&mut reader).unwrap(), b"first");
        assert_eq!(read_frame(&mut reader).unwrap(), b"second");
        assert!(read_frame(&mut reader).unwrap_err().is_closed());
    }
}
