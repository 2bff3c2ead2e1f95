//! Cooperative cancellation
//!
//! A [`Shutdown`] token is checked at loop boundaries (the accept loop and
//! the ping loop). Nothing is interrupted mid-I/O; a blocking read or write
//! finishes (or fails) before the token is observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Granularity of [`Shutdown::sleep`].
const SLEEP_SLICE: Duration = Duration::from_millis(50);

static INTERRUPT: OnceLock<Shutdown> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early if the token is triggered.
    ///
    /// Returns `true` if the token was triggered.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// Trigger the returned token on the first interactive interrupt (SIGINT).
///
/// The handler restores the default disposition after it fires, so a second
/// interrupt terminates the process even if a blocking call never returns.
/// Every call returns the same process-wide token.
pub fn install_interrupt_handler() -> Shutdown {
    let token = INTERRUPT.get_or_init(Shutdown::new).clone();

    #[cfg(unix)]
    {
        let handler = on_interrupt as extern "C" fn(libc::c_int);
        // SAFETY: the handler only performs an atomic store and re-registers
        // the default disposition, both async-signal-safe.
        let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            warn!("Failed to install interrupt handler");
        } else {
            debug!("Interrupt handler installed");
        }
    }

    #[cfg(not(unix))]
    warn!("Interrupt handling is only supported on unix; stop with the platform's kill mechanism");

    token
}

#[cfg(unix)]
extern "C" fn on_interrupt(_signal: libc::c_int) {
    if let Some(token) = INTERRUPT.get() {
        token.flag.store(true, Ordering::SeqCst);
    }
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}
