//! Listening socket and accept loop

use crate::net::Timeouts;
use crate::server::config::ServerConfig;
use crate::server::error::{Result, ServerError};
use crate::server::handler::ConnectionHandler;
use crate::server::monitor::{active_connections_line, ServerCounters, ServerMonitor, ServerStats};
use crate::shutdown::Shutdown;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn, Dispatch};

/// Accepts connections and hands each one to its own handler thread.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    name: String,
    timeouts: Timeouts,
    accept_poll: Duration,
    show_status: bool,
    monitor: ServerMonitor,
    dispatch: Dispatch,
}

impl Server {
    /// Bind the listening socket described by `config`.
    ///
    /// All events of this server and its handler threads are emitted under
    /// `dispatch`.
    pub fn bind(config: &ServerConfig, dispatch: Dispatch) -> Result<Self> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        // The accept loop polls so that it can observe shutdown between accepts.
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        tracing::dispatcher::with_default(&dispatch, || {
            debug!(requested = %addr, bound = %local_addr, "Listener bound");
        });

        Ok(Self {
            listener,
            local_addr,
            name: config.name.clone(),
            timeouts: config.timeouts(),
            accept_poll: config.accept_poll(),
            show_status: config.status,
            monitor: ServerMonitor::new(config.status_interval()),
            dispatch,
        })
    }

    /// The address actually bound, with an ephemeral port resolved.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn counters(&self) -> ServerCounters {
        self.monitor.counters()
    }

    pub fn stats(&self) -> ServerStats {
        self.monitor.stats()
    }

    /// Startup banner with the server name framed by asterisks.
    pub fn banner(&self) -> String {
        let label = format!("----- {} -----", self.name);
        let rule = "*".repeat(label.len());
        format!("{}\n{}\n{}", rule, label, rule)
    }

    /// Accept connections until `shutdown` is triggered.
    ///
    /// Handler threads are detached; they are not joined on shutdown. Any
    /// accept failure other than "no connection pending" stops the loop and
    /// is returned.
    pub fn run(&self, shutdown: &Shutdown) -> Result<()> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            println!("\n{}\n", self.banner());
            info!(
                "[SERVER START] Server {}:{} listening!",
                self.local_addr.ip(),
                self.local_addr.port()
            );

            // The display gets its own token: stopping it must not cancel
            // other servers sharing the caller's token.
            let status = self.show_status.then(|| {
                let stop = Shutdown::new();
                (self.monitor.start_display(stop.clone()), stop)
            });

            let result = self.accept_loop(shutdown);
            match &result {
                Ok(()) => warn!("[SERVER STOP] Shutdown requested, stopping server..."),
                Err(e) => warn!("[SERVER STOP] Error during server handling: {}", e),
            }

            if let Some((handle, stop)) = status {
                stop.trigger();
                handle.join().ok();
            }

            let stats = self.stats();
            info!(
                accepted = stats.accepted,
                messages = stats.messages,
                errors = stats.errors,
                uptime_secs = stats.elapsed.as_secs(),
                "Server statistics"
            );
            println!("\n******* SERVER STOPPED *******\n");
            result
        })
    }

    fn accept_loop(&self, shutdown: &Shutdown) -> Result<()> {
        let counters = self.monitor.counters();

        while !shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    self.spawn_handler(stream, peer, &counters);
                    info!("{}", active_connections_line(counters.active()));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    shutdown.sleep(self.accept_poll);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ServerError::Accept(e)),
            }
        }
        Ok(())
    }

    fn spawn_handler(&self, stream: TcpStream, peer: SocketAddr, counters: &ServerCounters) {
        if let Err(e) = self.prepare_stream(&stream) {
            counters.increment_error();
            warn!(peer = %peer, error = %e, "Failed to configure connection, dropping it");
            return;
        }

        let guard = counters.connection_opened();
        let dispatch = self.dispatch.clone();
        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    let outcome = ConnectionHandler::new(stream, peer, guard).run();
                    debug!(peer = %peer, exchanges = outcome.exchanges, "Handler finished");
                })
            });

        if let Err(e) = spawned {
            counters.increment_error();
            warn!(peer = %peer, error = %e, "Failed to spawn connection handler");
        }
    }

    fn prepare_stream(&self, stream: &TcpStream) -> std::io::Result<()> {
        // Some platforms hand out accepted sockets with the listener's
        // non-blocking flag; handlers use blocking I/O.
        stream.set_nonblocking(false)?;
        self.timeouts.apply(stream)
    }
}
