//! The informational-signal flag that asks the reflector for a timestamp
//! dump.
//!
//! The handler does nothing but flip an atomic and re-arm itself; the dump
//! — file I/O and all — happens on the next loop tick, where it is safe.
//! Platforms with SIGINFO get it, everything else listens on SIGUSR1.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};


cfg_if::cfg_if! {
    if #[cfg(any(target_os = "macos", target_os = "freebsd",
                 target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly"))] {
        const DUMP_SIGNAL: libc::c_int = libc::SIGINFO;
    }
    else {
        const DUMP_SIGNAL: libc::c_int = libc::SIGUSR1;
    }
}

static DUMP_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_dump_signal(signal: libc::c_int) {
    DUMP_REQUESTED.store(true, Ordering::Relaxed);
    let _ = arm(signal);
}

fn arm(signal: libc::c_int) -> libc::sighandler_t {
    let handler: extern "C" fn(libc::c_int) = on_dump_signal;

    unsafe { libc::signal(signal, handler as libc::sighandler_t) }
}

/// Installs the dump-signal handler.
pub fn install_dump_handler() -> io::Result<()> {
    if arm(DUMP_SIGNAL) == libc::SIG_ERR {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Takes the pending dump request, clearing it.
pub fn take_dump_request() -> bool {
    DUMP_REQUESTED.swap(false, Ordering::Relaxed)
}
