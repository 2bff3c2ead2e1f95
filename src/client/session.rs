use crate::client::constants::{MAX_RESPONSE_SIZE, PING_INTERVAL_MS};
use crate::client::error::{ClientError, Result};
use crate::client::progress::PingProgress;
use crate::client::reporter::Reporter;
use crate::client::sink::LatencySink;
use crate::client::socket::{TcpTransport, Transport};
use crate::client::statistics::PingStatistics;
use crate::net::Timeouts;
use crate::protocol::{Message, ProtocolError, ACK_MESSAGE, DISCONNECT_MESSAGE};
use crate::shutdown::Shutdown;
use crate::timing::TimeInterval;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn, Dispatch};

/// Settings of one ping run
#[derive(Debug, Clone)]
pub struct PingOptions {
    /// Pause between two pings
    pub interval: Duration,
    /// Stop after this many samples; `None` runs until cancelled
    pub count: Option<usize>,
    /// Hand the samples to the session's sinks when done
    pub collect: bool,
    /// Suppress per-ping lines, the spinner and the printed summary
    pub quiet: bool,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(PING_INTERVAL_MS),
            count: None,
            collect: false,
            quiet: false,
        }
    }
}

/// Result of a ping run
#[derive(Debug, Clone)]
pub struct PingReport {
    /// Round-trip times in milliseconds, in send order
    pub samples: Vec<f64>,
    pub statistics: Option<PingStatistics>,
    /// Wall-clock time from loop start to completion
    pub duration: TimeInterval,
    /// Whether the loop was stopped by the shutdown token
    pub interrupted: bool,
}

/// One outbound connection with strictly alternating request/acknowledgement.
pub struct ClientSession<T: Transport = TcpTransport> {
    transport: T,
    peer: String,
    sinks: Vec<Box<dyn LatencySink + Send>>,
    dispatch: Dispatch,
}

impl ClientSession<TcpTransport> {
    /// Connect to `host:port`. Failure to connect is returned, not logged away.
    pub fn connect(host: &str, port: u16, timeouts: Timeouts, dispatch: Dispatch) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let transport = tracing::dispatcher::with_default(&dispatch, || {
            let transport = TcpTransport::connect(&addr)?;
            transport.set_timeouts(&timeouts)?;
            info!("[CLIENT] Connected to {}:{}", host, port);
            Ok::<_, ClientError>(transport)
        })?;
        Ok(Self::with_transport(transport, addr, dispatch))
    }
}

impl<T: Transport> ClientSession<T> {
    pub fn with_transport(transport: T, peer: impl Into<String>, dispatch: Dispatch) -> Self {
        Self {
            transport,
            peer: peer.into(),
            sinks: Vec::new(),
            dispatch,
        }
    }

    /// Add a consumer for the samples of collecting ping runs.
    pub fn with_sink(mut self, sink: Box<dyn LatencySink + Send>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one message and wait for the reply.
    ///
    /// The clock starts after the length header is written and stops when
    /// the reply arrives, so the header write is not part of the round trip.
    /// A disconnect expects no acknowledgement and yields `None`.
    pub fn exchange(&mut self, message: &Message) -> Result<Option<Duration>> {
        let frame = message.encode()?;
        self.transport.send_bytes(frame.header())?;

        let start = Instant::now();
        self.transport.send_bytes(frame.body())?;
        let mut response = [0u8; MAX_RESPONSE_SIZE];
        let len = self.transport.recv_response(&mut response)?;
        let rtt = start.elapsed();

        if *message == Message::Disconnect {
            if len > 0 {
                warn!(bytes = len, "Unexpected reply to disconnect");
            }
            return Ok(None);
        }

        if len == 0 {
            return Err(ClientError::Protocol(ProtocolError::ConnectionClosed));
        }
        if &response[..len] != ACK_MESSAGE.as_bytes() {
            debug!(
                response = %String::from_utf8_lossy(&response[..len]),
                "Reply differs from the usual acknowledgement"
            );
        }
        Ok(Some(rtt))
    }

    /// Send `text` and report its round-trip time in milliseconds.
    ///
    /// Errors are logged as warnings and never returned; `None` means no
    /// latency was measured (a disconnect, or a failed exchange).
    pub fn send(&mut self, text: &str) -> Option<f64> {
        let message = Message::from_text(text);
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || self.send_message(&message))
    }

    fn send_message(&mut self, message: &Message) -> Option<f64> {
        match self.exchange(message) {
            Ok(Some(rtt)) => {
                let latency_ms = as_millis(rtt);
                info!(latency_ms = latency_ms, "Latency: {:.3} ms", latency_ms);
                Some(latency_ms)
            }
            Ok(None) => {
                debug!(peer = %self.peer, "Disconnect sent");
                None
            }
            Err(e) => {
                warn!("Error during client communication: {}", e);
                None
            }
        }
    }

    /// Tell the server to close the connection.
    pub fn disconnect(&mut self) {
        self.send(DISCONNECT_MESSAGE);
    }

    /// Ping repeatedly until `shutdown` is triggered, `options.count` samples
    /// are collected, or an exchange fails.
    ///
    /// However the loop ends, the summary is produced, the samples are handed
    /// to the sinks if `options.collect` is set, and a disconnect is sent.
    pub fn ping(&mut self, options: &PingOptions, shutdown: &Shutdown) -> PingReport {
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || self.ping_loop(options, shutdown))
    }

    fn ping_loop(&mut self, options: &PingOptions, shutdown: &Shutdown) -> PingReport {
        info!(peer = %self.peer, "Running ping @ target {}", self.peer);

        // Wall clock for the human-facing total; the samples use a monotonic clock.
        let started = SystemTime::now();
        let mut progress = PingProgress::new(options.quiet);
        let mut samples = Vec::new();
        let mut interrupted = false;

        loop {
            if shutdown.is_triggered() {
                interrupted = true;
                break;
            }

            match self.exchange(&Message::Ping) {
                Ok(Some(rtt)) => {
                    let latency_ms = as_millis(rtt);
                    samples.push(latency_ms);
                    progress.record(latency_ms);
                    debug!(latency_ms = latency_ms, seq = samples.len(), "Ping acknowledged");
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Error during ping routine: {}", e);
                    break;
                }
            }

            if options.count.is_some_and(|count| samples.len() >= count) {
                break;
            }
            if shutdown.sleep(options.interval) {
                interrupted = true;
                break;
            }
        }
        progress.finish();

        if interrupted {
            info!("[CLIENT PING STOP] Stopping ping.");
        }

        let elapsed = started.elapsed().unwrap_or_default();
        let statistics = match PingStatistics::from_samples(&samples) {
            Ok(statistics) => statistics,
            Err(e) => {
                warn!("Failed to compute ping statistics: {}", e);
                None
            }
        };
        let report = PingReport {
            samples,
            statistics,
            duration: TimeInterval::from_elapsed(elapsed),
            interrupted,
        };

        if !options.quiet {
            Reporter::print_summary(&report);
        }

        if options.collect {
            for sink in &self.sinks {
                sink.consume(&report.samples);
            }
        }

        self.send_message(&Message::Disconnect);
        report
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::socket::MockTransport;
    use crate::protocol::{HEADER_SIZE, PING_MESSAGE};
    use mockall::{mock, Sequence};
    use std::io::ErrorKind;

    mock! {
        pub Sink {}

        impl LatencySink for Sink {
            fn consume(&self, samples: &[f64]);
        }
    }

    fn ack(buf: &mut [u8]) -> Result<usize> {
        let ack = ACK_MESSAGE.as_bytes();
        buf[..ack.len()].copy_from_slice(ack);
        Ok(ack.len())
    }

    fn session(transport: MockTransport) -> ClientSession<MockTransport> {
        ClientSession::with_transport(transport, "127.0.0.1:5050", Dispatch::none())
    }

    fn quiet_options(count: usize) -> PingOptions {
        PingOptions {
            interval: Duration::from_millis(1),
            count: Some(count),
            collect: false,
            quiet: true,
        }
    }

    #[test]
    fn test_send_writes_header_then_payload() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();

        transport
            .expect_send_bytes()
            .withf(|buf: &[u8]| buf.len() == HEADER_SIZE && buf.starts_with(b"12 "))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        transport
            .expect_send_bytes()
            .withf(|buf: &[u8]| buf == b"Hello world!")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        transport
            .expect_recv_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(ack);

        let latency = session(transport).send("Hello world!");
        assert!(latency.is_some_and(|ms| ms >= 0.0));
    }

    #[test]
    fn test_disconnect_reports_no_latency() {
        let mut transport = MockTransport::new();
        transport.expect_send_bytes().times(2).returning(|_| Ok(()));
        transport.expect_recv_response().times(1).returning(|_| Ok(0));

        assert_eq!(session(transport).send("!DISCONNECT"), None);
    }

    #[test]
    fn test_send_swallows_io_errors() {
        let mut transport = MockTransport::new();
        transport.expect_send_bytes().times(1).returning(|_| {
            Err(ClientError::Io(std::io::Error::from(ErrorKind::BrokenPipe)))
        });

        assert_eq!(session(transport).send("Hello"), None);
    }

    #[test]
    fn test_exchange_detects_closed_connection() {
        let mut transport = MockTransport::new();
        transport.expect_send_bytes().times(2).returning(|_| Ok(()));
        transport.expect_recv_response().times(1).returning(|_| Ok(0));

        let result = session(transport).exchange(&Message::Data("Hello".into()));
        assert!(matches!(
            result,
            Err(ClientError::Protocol(ProtocolError::ConnectionClosed))
        ));
    }

    #[test]
    fn test_ping_collects_samples_and_disconnects() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_bytes()
            .withf(|buf: &[u8]| buf == PING_MESSAGE.as_bytes())
            .times(3)
            .returning(|_| Ok(()));
        transport
            .expect_send_bytes()
            .withf(|buf: &[u8]| buf == b"!DISCONNECT")
            .times(1)
            .returning(|_| Ok(()));
        transport
            .expect_send_bytes()
            .withf(|buf: &[u8]| buf.len() == HEADER_SIZE)
            .times(4)
            .returning(|_| Ok(()));

        let mut calls = 0;
        transport.expect_recv_response().times(4).returning(move |buf| {
            calls += 1;
            if calls <= 3 {
                ack(buf)
            } else {
                Ok(0)
            }
        });

        let report = session(transport).ping(&quiet_options(3), &Shutdown::new());

        assert_eq!(report.samples.len(), 3);
        assert!(!report.interrupted);
        let stats = report.statistics.expect("statistics for collected samples");
        assert!(stats.min() <= stats.mean() && stats.mean() <= stats.max());
    }

    #[test]
    fn test_ping_stops_when_cancelled() {
        let mut transport = MockTransport::new();
        transport.expect_send_bytes().times(2).returning(|_| Ok(()));
        transport.expect_recv_response().times(1).returning(|_| Ok(0));

        let shutdown = Shutdown::new();
        shutdown.trigger();
        let report = session(transport).ping(&quiet_options(10), &shutdown);

        assert!(report.interrupted);
        assert!(report.samples.is_empty());
        assert!(report.statistics.is_none());
    }

    #[test]
    fn test_ping_failure_still_disconnects() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        // First the ping header write fails, then the disconnect attempt.
        transport.expect_send_bytes().times(2).returning(move |_| {
            calls += 1;
            let kind = if calls == 1 {
                ErrorKind::ConnectionReset
            } else {
                ErrorKind::BrokenPipe
            };
            Err(ClientError::Io(std::io::Error::from(kind)))
        });

        let report = session(transport).ping(&quiet_options(5), &Shutdown::new());
        assert!(report.samples.is_empty());
        assert!(!report.interrupted);
    }

    #[test]
    fn test_ping_hands_samples_to_sinks_when_collecting() {
        let mut transport = MockTransport::new();
        transport.expect_send_bytes().returning(|_| Ok(()));
        let mut calls = 0;
        transport.expect_recv_response().returning(move |buf| {
            calls += 1;
            if calls <= 2 {
                ack(buf)
            } else {
                Ok(0)
            }
        });

        let mut sink = MockSink::new();
        sink.expect_consume()
            .withf(|samples: &[f64]| samples.len() == 2)
            .times(1)
            .return_const(());

        let options = PingOptions {
            collect: true,
            ..quiet_options(2)
        };
        let report = session(transport)
            .with_sink(Box::new(sink))
            .ping(&options, &Shutdown::new());
        assert_eq!(report.samples.len(), 2);
    }

    #[test]
    fn test_ping_skips_sinks_without_collect() {
        let mut transport = MockTransport::new();
        transport.expect_send_bytes().returning(|_| Ok(()));
        let mut calls = 0;
        transport.expect_recv_response().returning(move |buf| {
            calls += 1;
            if calls <= 1 {
                ack(buf)
            } else {
                Ok(0)
            }
        });

        let mut sink = MockSink::new();
        sink.expect_consume().times(0);

        session(transport)
            .with_sink(Box::new(sink))
            .ping(&quiet_options(1), &Shutdown::new());
    }
}
