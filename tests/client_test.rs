use axon::client::{ClientSession, OutputWriter, PingOptions, Result};
use axon::net::Timeouts;
use axon::protocol::Message;
use axon::server::{Server, ServerConfig};
use axon::shutdown::Shutdown;
use std::fs;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::Dispatch;

/// Test helper: in-memory log sink shared with the server's dispatcher
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn dispatch(&self) -> Dispatch {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        Dispatch::new(subscriber)
    }

    /// Wait until `needle` has been logged, for events emitted after the
    /// client already saw the effect.
    fn wait_for(&self, needle: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if self.contents().contains(needle) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<axon::server::Result<()>>,
}

impl TestServer {
    /// Test helper: start a server on an ephemeral port in a background thread
    fn start(logs: &LogBuffer) -> Self {
        let config = ServerConfig {
            port: 0,
            accept_poll_ms: 10,
            ..ServerConfig::default()
        };
        let server = Server::bind(&config, logs.dispatch()).expect("Failed to bind test server");
        let addr = server.local_addr();
        let shutdown = Shutdown::new();
        let run_shutdown = shutdown.clone();
        let handle = thread::spawn(move || server.run(&run_shutdown));
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn connect(&self) -> Result<ClientSession> {
        ClientSession::connect(
            &self.addr.ip().to_string(),
            self.addr.port(),
            Timeouts::from_millis(Some(5000), Some(5000)),
            Dispatch::none(),
        )
    }

    fn stop(self) {
        self.shutdown.trigger();
        let result = self.handle.join().expect("server thread panicked");
        assert!(result.is_ok());
    }
}

#[test]
fn test_end_to_end_send_and_disconnect() -> Result<()> {
    let logs = LogBuffer::default();
    let server = TestServer::start(&logs);
    assert!(logs.wait_for(&format!("[SERVER START] Server 127.0.0.1:{} listening!", server.addr.port())));

    let mut session = server.connect()?;
    let local = session.transport().local_addr()?;

    let latency = session.send("Hello world!").expect("latency measured");
    assert!(latency > 0.0);
    assert!(logs
        .contents()
        .contains(&format!("[MESSAGE RECEIVED] 127.0.0.1:{} | Hello world!", local.port())));

    // The disconnect read only returns once the server has closed its side.
    let reply = session.exchange(&Message::Disconnect)?;
    assert!(reply.is_none());
    assert!(logs.wait_for(&format!(
        "[NEW DISCONNECTION] Client at 127.0.0.1:{} disconnected!",
        local.port()
    )));

    server.stop();
    Ok(())
}

#[test]
fn test_ping_is_acknowledged_but_not_logged() -> Result<()> {
    let logs = LogBuffer::default();
    let server = TestServer::start(&logs);
    let mut session = server.connect()?;

    assert!(session.send("first").is_some());
    assert!(session.send("!PING").is_some());
    assert!(session.send("!PING").is_some());
    session.disconnect();
    assert!(logs.wait_for("[NEW DISCONNECTION]"));

    let contents = logs.contents();
    assert_eq!(contents.matches("[MESSAGE RECEIVED]").count(), 1);
    assert!(!contents.contains("| !PING"));

    server.stop();
    Ok(())
}

#[test]
fn test_ping_loop_end_to_end() -> Result<()> {
    let logs = LogBuffer::default();
    let server = TestServer::start(&logs);

    let output = std::env::temp_dir().join(format!("axon-ping-{}.txt", std::process::id()));
    let mut session = server
        .connect()?
        .with_sink(Box::new(OutputWriter::new(&output)));

    let options = PingOptions {
        interval: Duration::from_millis(10),
        count: Some(3),
        collect: true,
        quiet: true,
    };
    let report = session.ping(&options, &Shutdown::new());

    assert_eq!(report.samples.len(), 3);
    assert!(report.samples.iter().all(|&ms| ms > 0.0));
    assert!(!report.interrupted);
    let stats = report.statistics.expect("statistics");
    assert!(stats.min() <= stats.mean() && stats.mean() <= stats.max());
    assert_eq!(report.duration.total_seconds(), 0);

    let exported = fs::read_to_string(&output).expect("samples exported");
    fs::remove_file(&output).ok();
    assert_eq!(exported.lines().count(), 4);

    // The ping run ends with a disconnect of its own.
    assert!(logs.wait_for("[NEW DISCONNECTION]"));
    assert_eq!(logs.contents().matches("[MESSAGE RECEIVED]").count(), 0);

    server.stop();
    Ok(())
}

#[test]
fn test_ping_cancelled_from_another_thread() -> Result<()> {
    let logs = LogBuffer::default();
    let server = TestServer::start(&logs);
    let mut session = server.connect()?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        trigger.trigger();
    });

    let options = PingOptions {
        interval: Duration::from_millis(20),
        count: None,
        collect: false,
        quiet: true,
    };
    let report = session.ping(&options, &shutdown);
    canceller.join().unwrap();

    assert!(report.interrupted);
    assert!(!report.samples.is_empty());
    assert!(logs.wait_for("[NEW DISCONNECTION]"));

    server.stop();
    Ok(())
}

#[test]
fn test_connect_failure_is_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = ClientSession::connect("127.0.0.1", port, Timeouts::none(), Dispatch::none());
    assert!(result.is_err());
}
