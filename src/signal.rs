//! Termination signals raise the capture's stop flag.

use std::io;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI32, Ordering};

use libc::c_int;

use crate::{Error, Result, StopFlag};

pub use libc::{SIGHUP, SIGINT, SIGTERM};

pub const DEFAULT_SIGNALS: [c_int; 3] = [SIGINT, SIGTERM, SIGHUP];

static STOP: OnceLock<StopFlag> = OnceLock::new();
static CAUGHT: AtomicI32 = AtomicI32::new(0);

// Runs in signal context: atomics only.
extern "C" fn handle_signal(signum: c_int) {
    CAUGHT.store(signum, Ordering::SeqCst);
    if let Some(stop) = STOP.get() {
        stop.raise();
    }
}

/// Installs a handler for each of `signals` that raises `stop`. Once per process.
pub fn install(stop: &StopFlag, signals: &[c_int]) -> Result<()> {
    STOP.set(stop.clone())
        .map_err(|_| Error::InvalidState("signal handlers already installed"))?;
    for &signum in signals {
        let handler = handle_signal as extern "C" fn(c_int) as libc::sighandler_t;
        if unsafe { libc::signal(signum, handler) } == libc::SIG_ERR {
            return Err(io::Error::last_os_error().into())
        }
        log::debug!("installed handler for signal {}", signum);
    }
    Ok(())
}

/// The last signal caught, if any.
pub fn caught() -> Option<c_int> {
    match CAUGHT.load(Ordering::SeqCst) {
        0 => None,
        signum => Some(signum),
    }
}
