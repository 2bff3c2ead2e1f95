//! Server connection tracking and status display

use crate::shutdown::Shutdown;
use colored::*;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    accepted: AtomicU64,
    messages: AtomicU64,
    acks_sent: AtomicU64,
    errors: AtomicU64,
}

/// Monitor for tracking server connection statistics.
///
/// All counters are updated with relaxed atomics. The active-connection
/// figure is advisory: it is read without synchronizing against concurrent
/// accepts and disconnects, so a logged value may already be stale. It is
/// for logging only and never gates admission.
pub struct ServerMonitor {
    counters: Arc<Counters>,
    start_time: Instant,
    update_interval: Duration,
}

impl ServerMonitor {
    pub fn new(update_interval: Duration) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            start_time: Instant::now(),
            update_interval,
        }
    }

    /// Get counters for use in the accept loop and connection handlers.
    pub fn counters(&self) -> ServerCounters {
        ServerCounters {
            inner: Arc::clone(&self.counters),
        }
    }

    /// Start the background status line thread.
    ///
    /// The thread only reads counters; handlers never wait on it. It exits
    /// once `shutdown` is triggered.
    pub fn start_display(&self, shutdown: Shutdown) -> JoinHandle<()> {
        let counters = Arc::clone(&self.counters);
        let update_interval = self.update_interval;

        thread::spawn(move || {
            let mut last_messages = 0u64;

            while !shutdown.sleep(update_interval) {
                let active = counters.active.load(Ordering::Relaxed);
                let messages = counters.messages.load(Ordering::Relaxed);
                let acks = counters.acks_sent.load(Ordering::Relaxed);
                let errors = counters.errors.load(Ordering::Relaxed);

                let busy = messages > last_messages;
                let indicator = Self::render_indicator(active, busy);
                print!(
                    "\r{} Connections: {} | Messages: {} | Acks: {} | Errors: {}",
                    indicator, active, messages, acks, errors
                );
                std::io::Write::flush(&mut std::io::stdout()).ok();

                last_messages = messages;
            }
            println!();
        })
    }

    fn render_indicator(active: usize, busy: bool) -> String {
        if active == 0 {
            "░ [IDLE]  ".normal().to_string()
        } else if busy {
            "█ [ACTIVE]".red().bold().to_string()
        } else {
            "░ [OPEN]  ".red().to_string()
        }
    }

    pub fn stats(&self) -> ServerStats {
        self.counters().snapshot(self.start_time.elapsed())
    }
}

/// Cloneable handle on the server's counters.
#[derive(Debug, Clone)]
pub struct ServerCounters {
    inner: Arc<Counters>,
}

impl ServerCounters {
    /// Record a newly accepted connection.
    ///
    /// The active count is decremented when the returned guard is dropped,
    /// whichever way the connection ends.
    pub fn connection_opened(&self) -> ConnectionGuard {
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
        self.inner.active.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            counters: self.clone(),
        }
    }

    /// Approximate number of live connections.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn increment_message(&self) {
        self.inner.messages.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_ack(&self) {
        self.inner.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_error(&self) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, elapsed: Duration) -> ServerStats {
        ServerStats {
            active: self.inner.active.load(Ordering::Relaxed),
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            messages: self.inner.messages.load(Ordering::Relaxed),
            acks_sent: self.inner.acks_sent.load(Ordering::Relaxed),
            errors: self.inner.errors.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Holds one slot of the active-connection count.
#[derive(Debug)]
pub struct ConnectionGuard {
    counters: ServerCounters,
}

impl ConnectionGuard {
    pub fn counters(&self) -> &ServerCounters {
        &self.counters
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counters.inner.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Point-in-time server statistics.
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub active: usize,
    pub accepted: u64,
    pub messages: u64,
    pub acks_sent: u64,
    pub errors: u64,
    pub elapsed: Duration,
}

/// Log line for the active connection count.
pub fn active_connections_line(active: usize) -> String {
    let plural = if active == 1 { "" } else { "s" };
    format!("[ACTIVE CONNECTIONS] {} connection{}", active, plural)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let monitor = ServerMonitor::new(Duration::from_millis(100));
        let counters = monitor.counters();

        counters.increment_message();
        counters.increment_ack();
        counters.increment_error();

        let stats = monitor.stats();
        assert_eq!(stats.messages, 1);
        assert_eq!(stats.acks_sent, 1);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_guard_releases_active_slot() {
        let monitor = ServerMonitor::new(Duration::from_millis(100));
        let counters = monitor.counters();

        let first = counters.connection_opened();
        let second = counters.connection_opened();
        assert_eq!(counters.active(), 2);

        drop(first);
        assert_eq!(counters.active(), 1);
        drop(second);
        assert_eq!(counters.active(), 0);
        assert_eq!(monitor.stats().accepted, 2);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let monitor = ServerMonitor::new(Duration::from_millis(100));
        let counters = monitor.counters();
        let guard = counters.connection_opened();

        let result = thread::spawn(move || {
            let _guard = guard;
            panic!("handler failure");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(counters.active(), 0);
    }

    #[test]
    fn test_display_thread_stops_on_shutdown() {
        let monitor = ServerMonitor::new(Duration::from_millis(10));
        let shutdown = Shutdown::new();
        let handle = monitor.start_display(shutdown.clone());
        thread::sleep(Duration::from_millis(30));
        shutdown.trigger();
        assert!(handle.join().is_ok());
    }

    #[test]
    fn test_active_connections_line() {
        assert_eq!(active_connections_line(1), "[ACTIVE CONNECTIONS] 1 connection");
        assert_eq!(active_connections_line(3), "[ACTIVE CONNECTIONS] 3 connections");
        assert_eq!(active_connections_line(0), "[ACTIVE CONNECTIONS] 0 connections");
    }
}
