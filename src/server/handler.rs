//! Per-connection request handling

use crate::protocol::{frame, Message, ProtocolError, ProtocolResult, ACK_MESSAGE};
use crate::server::monitor::{active_connections_line, ConnectionGuard};
use std::io::{Read, Write};
use std::net::SocketAddr;
use tracing::{debug, info, warn};

/// States of one connection's read/dispatch/reply cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerState {
    AwaitingHeader,
    AwaitingBody(usize),
    Dispatch(Message),
    Closed(CloseReason),
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a disconnect message.
    Disconnected,
    /// The stream ended without a disconnect message.
    PeerClosed,
    /// A malformed frame or a socket error.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Messages acknowledged on this connection.
    pub exchanges: u64,
    pub reason: CloseReason,
}

/// Serves one accepted connection until it closes.
///
/// The handler owns the stream; [`run`](Self::run) consumes the handler, so the
/// stream is closed exactly once, whichever state led to `Closed`. The
/// connection guard is released right after.
pub struct ConnectionHandler<S> {
    stream: S,
    peer: SocketAddr,
    guard: ConnectionGuard,
}

impl<S: Read + Write> ConnectionHandler<S> {
    pub fn new(stream: S, peer: SocketAddr, guard: ConnectionGuard) -> Self {
        Self {
            stream,
            peer,
            guard,
        }
    }

    pub fn run(mut self) -> HandlerOutcome {
        info!(
            "[NEW CONNECTION] Client at {}:{} connected.",
            self.peer.ip(),
            self.peer.port()
        );

        let mut exchanges = 0u64;
        let mut state = HandlerState::AwaitingHeader;

        let reason = loop {
            state = match state {
                HandlerState::AwaitingHeader => match frame::read_header(&mut self.stream) {
                    Ok(len) => HandlerState::AwaitingBody(len),
                    Err(e) => self.fail(e),
                },
                HandlerState::AwaitingBody(len) => {
                    match frame::read_body(&mut self.stream, len).and_then(Message::decode) {
                        Ok(message) => HandlerState::Dispatch(message),
                        Err(e) => self.fail(e),
                    }
                }
                HandlerState::Dispatch(message) => match self.dispatch(message) {
                    Ok(true) => {
                        exchanges += 1;
                        HandlerState::AwaitingHeader
                    }
                    Ok(false) => HandlerState::Closed(CloseReason::Disconnected),
                    Err(e) => self.fail(e),
                },
                HandlerState::Closed(reason) => break reason,
            };
        };

        self.close(&reason);
        HandlerOutcome { exchanges, reason }
    }

    /// Handle one decoded message. Returns `false` when the connection should close.
    fn dispatch(&mut self, message: Message) -> ProtocolResult<bool> {
        self.guard.counters().increment_message();

        match message {
            Message::Disconnect => {
                info!(
                    "[NEW DISCONNECTION] Client at {}:{} disconnected!",
                    self.peer.ip(),
                    self.peer.port()
                );
                Ok(false)
            }
            Message::Ping => {
                self.acknowledge()?;
                debug!(peer = %self.peer, "Ping acknowledged");
                Ok(true)
            }
            Message::Data(text) => {
                info!(
                    "[MESSAGE RECEIVED] {}:{} | {}",
                    self.peer.ip(),
                    self.peer.port(),
                    text
                );
                self.acknowledge()?;
                Ok(true)
            }
        }
    }

    fn acknowledge(&mut self) -> ProtocolResult<()> {
        self.stream.write_all(ACK_MESSAGE.as_bytes())?;
        self.stream.flush()?;
        self.guard.counters().increment_ack();
        Ok(())
    }

    fn fail(&self, error: ProtocolError) -> HandlerState {
        if error.is_closed() {
            debug!(peer = %self.peer, "Client closed the stream");
            HandlerState::Closed(CloseReason::PeerClosed)
        } else {
            self.guard.counters().increment_error();
            warn!(peer = %self.peer, "Error during client handling: {}", error);
            HandlerState::Closed(CloseReason::Error(error.to_string()))
        }
    }

    fn close(self, reason: &CloseReason) {
        let Self {
            stream,
            peer,
            guard,
        } = self;
        drop(stream);

        let counters = guard.counters().clone();
        drop(guard);

        debug!(peer = %peer, reason = ?reason, "Connection closed");
        if *reason == CloseReason::Disconnected {
            info!("{}", active_connections_line(counters.active()));
        }
    }
}
